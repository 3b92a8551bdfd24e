use serde::{Deserialize, Serialize};

/// Body accepted by `POST /qris_generator`.
#[derive(Debug, Clone, Deserialize)]
pub struct QrisRequest {
    pub amount: i64,
    pub first_name: String,
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct QrisQuery {
    pub donation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerInfo {
    pub first_name: String,
    pub email: String,
    pub phone: String,
}

/// Donation payload posted to the provider's snap endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct QrisPayload {
    pub agree: bool,
    pub amount: i64,
    pub currency: &'static str,
    pub customer_info: CustomerInfo,
    pub email: String,
    pub first_name: String,
    pub phone: String,
    pub message: &'static str,
    #[serde(rename = "notUnderage")]
    pub not_underage: bool,
    pub payment_type: &'static str,
    pub vote: String,
}

impl From<QrisRequest> for QrisPayload {
    fn from(request: QrisRequest) -> Self {
        Self {
            agree: true,
            amount: request.amount,
            currency: "IDR",
            customer_info: CustomerInfo {
                first_name: request.first_name.clone(),
                email: request.email.clone(),
                phone: String::new(),
            },
            email: request.email,
            first_name: request.first_name,
            phone: String::new(),
            message: "Uji Coba Snap API",
            not_underage: true,
            payment_type: "qris",
            vote: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_merges_constants_with_caller_fields() {
        let request: QrisRequest = serde_json::from_value(json!({
            "email": "budi@example.com",
            "amount": 10000,
            "first_name": "Budi"
        }))
        .unwrap();

        let payload = serde_json::to_value(QrisPayload::from(request)).unwrap();

        assert_eq!(
            payload,
            json!({
                "agree": true,
                "amount": 10000,
                "currency": "IDR",
                "customer_info": {
                    "first_name": "Budi",
                    "email": "budi@example.com",
                    "phone": ""
                },
                "email": "budi@example.com",
                "first_name": "Budi",
                "phone": "",
                "message": "Uji Coba Snap API",
                "notUnderage": true,
                "payment_type": "qris",
                "vote": ""
            })
        );
    }

    #[test]
    fn test_request_requires_integer_amount() {
        let result: std::result::Result<QrisRequest, _> = serde_json::from_value(json!({
            "amount": "lots",
            "first_name": "Budi",
            "email": "budi@example.com"
        }));
        assert!(result.is_err());

        let missing: std::result::Result<QrisRequest, _> =
            serde_json::from_value(json!({"amount": 1, "first_name": "Budi"}));
        assert!(missing.is_err());
    }
}
