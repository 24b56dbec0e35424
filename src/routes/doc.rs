use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::CartLine,
        customers::UpsertCustomerRequest,
        discounts::{ActivateEventDiscountRequest, EventDiscountStatus},
        orders::{
            CancelOrderRequest, CancelOrderResponse, CheckoutRequest, ModifyOrderRequest,
            ModifyOrderResponse, OrderHistory, OrderList, QuoteRequest, QuoteResponse,
        },
    },
    models::{
        CanceledOrder, Customer, MenuCategory, ModificationType, ModifiedOrder, Order, OrderItem,
        OrderItemDetails, OrderStatus, PaymentMethod,
    },
    modifiers::{Modifier, ModifierKind},
    payment::PaymentRequest,
    pricing::{DiscountKind, EventDiscount, OrderDiscount, PayableBreakdown, VatBreakdown},
    response::{ApiResponse, ErrorBody, Meta},
    routes::{customers, discounts, health, orders, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::quote,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        orders::retry_cancel,
        orders::modify_order,
        orders::order_history,
        discounts::event_discount,
        discounts::activate_event_discount,
        discounts::deactivate_event_discount,
        customers::lookup_customer,
        customers::save_customer
    ),
    components(
        schemas(
            Order,
            OrderItem,
            OrderItemDetails,
            MenuCategory,
            Modifier,
            ModifierKind,
            PaymentMethod,
            OrderStatus,
            ModificationType,
            CanceledOrder,
            ModifiedOrder,
            Customer,
            DiscountKind,
            OrderDiscount,
            EventDiscount,
            PayableBreakdown,
            VatBreakdown,
            PaymentRequest,
            CartLine,
            CheckoutRequest,
            QuoteRequest,
            QuoteResponse,
            CancelOrderRequest,
            CancelOrderResponse,
            ModifyOrderRequest,
            ModifyOrderResponse,
            OrderList,
            OrderHistory,
            ActivateEventDiscountRequest,
            EventDiscountStatus,
            UpsertCustomerRequest,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ErrorBody,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<QuoteResponse>,
            ApiResponse<Customer>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Checkout, order history, cancel and modify"),
        (name = "Discounts", description = "Site-wide event discount"),
        (name = "Customers", description = "Customer lookup and registration"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
