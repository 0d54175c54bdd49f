//! Payment method value type.

use serde::{Deserialize, Serialize};

/// The payment method selected for an order.
///
/// Wire representation matches the vocabulary's spelling exactly
/// (`"Credit Card"`, not `"CreditCard"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "Cash on Delivery")]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Parses a payment method from its wire spelling, returning `None`
    /// for anything outside the allowed set (ingress validation error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Credit Card" => Some(Self::CreditCard),
            "Debit Card" => Some(Self::DebitCard),
            "Cash on Delivery" => Some(Self::CashOnDelivery),
            _ => None,
        }
    }

    /// Returns the wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "Credit Card",
            Self::DebitCard => "Debit Card",
            Self::CashOnDelivery => "Cash on Delivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_allowed_set() {
        assert_eq!(PaymentMethod::parse("Credit Card"), Some(PaymentMethod::CreditCard));
        assert_eq!(PaymentMethod::parse("Debit Card"), Some(PaymentMethod::DebitCard));
        assert_eq!(
            PaymentMethod::parse("Cash on Delivery"),
            Some(PaymentMethod::CashOnDelivery)
        );
    }

    #[test]
    fn parse_rejects_unknown_methods() {
        assert_eq!(PaymentMethod::parse("Bitcoin"), None);
        assert_eq!(PaymentMethod::parse(""), None);
    }

    #[test]
    fn display_matches_wire_spelling() {
        assert_eq!(PaymentMethod::CreditCard.to_string(), "Credit Card");
    }

    #[test]
    fn serialization_uses_wire_spelling() {
        let json = serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap();
        assert_eq!(json, "\"Cash on Delivery\"");
        let back: PaymentMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PaymentMethod::CashOnDelivery);
    }
}
