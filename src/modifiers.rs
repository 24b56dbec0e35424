use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Extra,
    Without,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Modifier {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ModifierKind,
    #[serde(default)]
    pub price: Decimal,
}

impl Modifier {
    pub fn extra(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ModifierKind::Extra,
            price,
        }
    }

    /// "Without" modifiers always carry a zero price.
    pub fn without(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ModifierKind::Without,
            price: Decimal::ZERO,
        }
    }

    pub fn price_contribution(&self) -> Decimal {
        match self.kind {
            ModifierKind::Extra => self.price,
            ModifierKind::Without => Decimal::ZERO,
        }
    }
}

pub fn extras_total(modifiers: &[Modifier]) -> Decimal {
    modifiers.iter().map(Modifier::price_contribution).sum()
}

pub fn effective_unit_price(base_price: Decimal, modifiers: &[Modifier]) -> Decimal {
    base_price + extras_total(modifiers)
}

pub fn toggle(modifiers: &mut Vec<Modifier>, modifier: Modifier) -> bool {
    if let Some(pos) = modifiers.iter().position(|m| m.id == modifier.id) {
        modifiers.remove(pos);
        false
    } else {
        modifiers.push(modifier);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn without_modifiers_never_change_price() {
        let mut priced_without = Modifier::without("m2", "No onions");
        priced_without.price = dec!(3);
        let modifiers = vec![Modifier::extra("m1", "Cheese", dec!(5)), priced_without];

        assert_eq!(extras_total(&modifiers), dec!(5));
        assert_eq!(effective_unit_price(dec!(20), &modifiers), dec!(25));
    }

    #[test]
    fn toggle_is_keyed_by_identity() {
        let mut modifiers = Vec::new();
        assert!(toggle(&mut modifiers, Modifier::extra("m1", "Cheese", dec!(5))));
        assert!(!toggle(&mut modifiers, Modifier::extra("m1", "Cheese", dec!(5))));
        assert!(modifiers.is_empty());

        toggle(&mut modifiers, Modifier::extra("m1", "Cheese", dec!(5)));
        toggle(&mut modifiers, Modifier::without("m2", "No salt"));
        assert_eq!(modifiers.len(), 2);
    }

    #[test]
    fn deserializes_type_tag() {
        let m: Modifier =
            serde_json::from_str(r#"{"id":"x","name":"Sauce","type":"extra","price":2.5}"#)
                .expect("modifier json");
        assert_eq!(m.kind, ModifierKind::Extra);
        assert_eq!(m.price, dec!(2.5));

        let w: Modifier = serde_json::from_str(r#"{"id":"y","name":"Ice","type":"without"}"#)
            .expect("without json");
        assert_eq!(w.price_contribution(), Decimal::ZERO);
    }
}
