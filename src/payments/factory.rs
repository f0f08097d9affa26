use crate::config::{PaytmConfig, UpiConfig};
use crate::models::PaymentMethod;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentProvider;
use crate::payments::providers::{ManualUpiProvider, PaytmProvider, StubGatewayProvider};
use crate::payments::types::ProviderName;
use std::sync::Arc;
use tracing::warn;

/// Builds every provider once and hands out shared handles
#[derive(Clone)]
pub struct PaymentProviderFactory {
    stub: Arc<StubGatewayProvider>,
    paytm: Arc<PaytmProvider>,
    manual: Arc<ManualUpiProvider>,
}

impl PaymentProviderFactory {
    pub fn from_config(paytm: &PaytmConfig, upi: &UpiConfig) -> PaymentResult<Self> {
        if !paytm.is_configured() {
            warn!("PAYTM_MID / PAYTM_MERCHANT_KEY not set; paytm payments will be refused");
        }
        Ok(Self::with_providers(
            StubGatewayProvider::new(),
            PaytmProvider::new(paytm.clone())?,
            ManualUpiProvider::new(upi.clone()),
        ))
    }

    pub fn with_providers(
        stub: StubGatewayProvider,
        paytm: PaytmProvider,
        manual: ManualUpiProvider,
    ) -> Self {
        Self {
            stub: Arc::new(stub),
            paytm: Arc::new(paytm),
            manual: Arc::new(manual),
        }
    }

    pub fn get_provider(&self, provider: ProviderName) -> Arc<dyn PaymentProvider> {
        match provider {
            ProviderName::Stub => self.stub.clone(),
            ProviderName::Paytm => self.paytm.clone(),
            ProviderName::ManualUpi => self.manual.clone(),
        }
    }

    /// Provider settling an order paid with `method`; cash orders have none
    pub fn for_method(&self, method: PaymentMethod) -> PaymentResult<Arc<dyn PaymentProvider>> {
        ProviderName::for_method(method)
            .map(|name| self.get_provider(name))
            .ok_or_else(|| {
                PaymentError::validation(
                    format!("payment method {} does not use a gateway", method.as_str()),
                    "paymentMethod",
                )
            })
    }

    /// Concrete redirect gateway, for the callback-only operations
    pub fn paytm(&self) -> Arc<PaytmProvider> {
        self.paytm.clone()
    }

    pub fn manual_upi(&self) -> Arc<ManualUpiProvider> {
        self.manual.clone()
    }

    pub fn list_available_providers(&self) -> Vec<ProviderName> {
        vec![ProviderName::Stub, ProviderName::Paytm, ProviderName::ManualUpi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn factory() -> PaymentProviderFactory {
        PaymentProviderFactory::from_config(
            &PaytmConfig {
                mid: String::new(),
                merchant_key: String::new(),
                website: "WEBSTAGING".to_string(),
                channel_id: "WEB".to_string(),
                industry_type: "Retail".to_string(),
                callback_url: "http://localhost:5000/api/paytm/callback".to_string(),
                frontend_url: "http://localhost:5173".to_string(),
                timeout_secs: 5,
                environment: Environment::Staging,
            },
            &UpiConfig {
                vpa: "shop@upi".to_string(),
                payee_name: "Shop".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn selects_provider_by_payment_method() {
        let factory = factory();
        assert_eq!(
            factory.for_method(PaymentMethod::Online).unwrap().name(),
            ProviderName::Stub
        );
        assert_eq!(
            factory.for_method(PaymentMethod::Paytm).unwrap().name(),
            ProviderName::Paytm
        );
        assert_eq!(
            factory.for_method(PaymentMethod::Upi).unwrap().name(),
            ProviderName::ManualUpi
        );
        assert!(factory.for_method(PaymentMethod::Cod).is_err());
    }

    #[test]
    fn list_available_providers_returns_all() {
        assert_eq!(factory().list_available_providers().len(), 3);
    }
}
