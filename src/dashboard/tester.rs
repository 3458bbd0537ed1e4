use crate::gateway::{GatewayError, SplitQrApi};
use crate::model::QrLookup;
use std::fmt::Write;
use std::sync::Arc;

/// Outcome of the last validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Valid(QrLookup),
    Invalid { qr_id: String, reason: String },
}

/// QR validator view: resolve a scanned QR id to its account.
pub struct QrValidator<G: SplitQrApi> {
    gateway: Arc<G>,
    pub input: String,
    last: Option<Verdict>,
}

impl<G: SplitQrApi> QrValidator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            input: String::new(),
            last: None,
        }
    }

    pub fn last(&self) -> Option<&Verdict> {
        self.last.as_ref()
    }

    pub async fn validate(&mut self) -> &Verdict {
        let qr_id = self.input.trim().to_string();
        let verdict = if qr_id.is_empty() {
            Verdict::Invalid {
                reason: GatewayError::validation("QR id is required").to_string(),
                qr_id,
            }
        } else {
            match self.gateway.lookup_qr(&qr_id).await {
                Ok(lookup) => Verdict::Valid(lookup),
                Err(e) => Verdict::Invalid {
                    qr_id,
                    reason: e.to_string(),
                },
            }
        };
        self.last.insert(verdict)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.last {
            None => {
                let _ = writeln!(out, "enter a QR id to validate");
            }
            Some(Verdict::Valid(lookup)) => {
                let a = &lookup.account;
                let _ = writeln!(
                    out,
                    "valid: {} -> table {} account {} ({}) total {:.2} paid {:.2} pending {:.2}",
                    a.qr_id,
                    lookup.table_number,
                    a.id,
                    a.status,
                    a.total,
                    a.paid,
                    a.outstanding()
                );
            }
            Some(Verdict::Invalid { qr_id, reason }) => {
                let _ = writeln!(out, "invalid: '{qr_id}' {reason}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{account, MockGateway};

    #[tokio::test]
    async fn known_qr_resolves_to_its_table() {
        let gateway = Arc::new(MockGateway::with_accounts(vec![account(4, 9, 5000, 1000)]));
        let mut validator = QrValidator::new(gateway);
        validator.input = "  qr-4 ".to_string();

        match validator.validate().await {
            Verdict::Valid(lookup) => {
                assert_eq!(lookup.table_number, 9);
                assert_eq!(lookup.account.id, 4);
            }
            other => panic!("expected valid verdict, got {other:?}"),
        }
        assert!(validator.render().contains("pending 40.00"));
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_a_request() {
        let gateway = Arc::new(MockGateway::default());
        let mut validator = QrValidator::new(gateway.clone());
        validator.input = "   ".to_string();

        assert!(matches!(validator.validate().await, Verdict::Invalid { .. }));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_qr_is_invalid() {
        let gateway = Arc::new(MockGateway::default());
        let mut validator = QrValidator::new(gateway);
        validator.input = "nope".to_string();

        validator.validate().await;
        assert!(validator.render().starts_with("invalid: 'nope'"));
    }
}
