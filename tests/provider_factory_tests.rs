//! Integration tests for the provider factory, the configuration source, and
//! the provider contract as seen through `Arc<dyn OnRampProvider>`.

use std::io::Write;
use std::sync::Arc;

use onramp_client::test_utils::{MOCK_PROVIDER_NAME, MockOnRampProvider};
use onramp_client::{
    AmountSpec, ConfigSource, ErrorCode, OnRampProvider, OrderRequest, OrderStatus,
    ProviderConfig, ProviderFactory, ProviderRegistry, QuoteRequest,
};
use rust_decimal_macros::dec;

fn mock_config() -> ProviderConfig {
    ProviderConfig::builder(MOCK_PROVIDER_NAME, "k").build()
}

fn factory_with_mock() -> ProviderFactory {
    let registry = ProviderRegistry::builtin();
    registry
        .register(MOCK_PROVIDER_NAME, MockOnRampProvider::constructor)
        .unwrap();
    ProviderFactory::new(Arc::new(registry), ConfigSource::new())
}

// ============================================================================
// FACTORY
// ============================================================================

mod factory_tests {
    use super::*;

    #[test]
    fn test_supported_names_are_consistent() {
        let factory = factory_with_mock();
        let listed = factory.list_supported();

        assert_eq!(listed, vec!["mock", "onramper"]);
        for name in &listed {
            assert!(factory.is_supported(name));
            assert!(factory.is_supported(&name.to_uppercase()));
        }
        assert!(!factory.is_supported("acme"));
    }

    #[test]
    fn test_factory_error_codes() {
        let factory = factory_with_mock();

        let err = factory.create("", mock_config()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let err = factory.create("acme", mock_config()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderNotSupported);

        let err = factory.create_with_defaults("mock").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_each_call_returns_a_fresh_adapter() {
        let factory = factory_with_mock();
        let first = factory.create("MOCK", mock_config()).unwrap();
        let second = factory.create("mock", mock_config()).unwrap();

        assert_eq!(first.provider_name(), "mock");
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_factory_from_toml_file_with_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [providers.onramper]
            api-key = "from-file"
            base-url = "http://127.0.0.1:1"
            timeout = 2
            retry-attempts = 0

            [providers.acme]
            api-key = "unused"
            "#
        )
        .unwrap();

        let source = ConfigSource::from_file(file.path())
            .unwrap()
            .with_environment([("PROVIDERS_ONRAMPER_ENABLED", "true")]);
        let factory = ProviderFactory::from_config_source(source);

        // acme has no adapter and is not eligible
        assert_eq!(factory.list_supported(), vec!["onramper"]);

        let provider = factory.create_from_config_source("onramper").unwrap();
        assert!(provider.validate_configuration().await);
        assert!(!provider.is_service_available().await);

        let err = provider.get_supported_assets().await.unwrap_err();
        assert!(matches!(
            err.code(),
            ErrorCode::NetworkError | ErrorCode::Timeout
        ));
    }

    #[test]
    fn test_disabled_provider_is_refused() {
        let factory = ProviderFactory::from_config_source(
            ConfigSource::from_pairs([("providers.onramper.api-key", "k")])
                .with_environment([("PROVIDERS_ONRAMPER_ENABLED", "false")]),
        );

        let err = factory.create_from_config_source("onramper").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);
    }
}

// ============================================================================
// CONTRACT
// ============================================================================

mod contract_tests {
    use super::*;

    fn adapter() -> Arc<dyn OnRampProvider> {
        factory_with_mock().create("mock", mock_config()).unwrap()
    }

    #[tokio::test]
    async fn test_history_is_unsupported() {
        let err = adapter().get_transaction_history("u1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unsupported);
        assert_eq!(err.provider_name(), Some("mock"));
    }

    #[tokio::test]
    async fn test_operations_before_configure() {
        let provider = MockOnRampProvider::new();
        assert!(!provider.validate_configuration().await);
        assert!(!provider.is_service_available().await);

        let err = provider.get_supported_assets().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_adapter_reports_configuration_before_input() {
        let provider = MockOnRampProvider::new();
        let quote = QuoteRequest::new("", "BTC", AmountSpec::InFiat(dec!(-1)));
        let order = OrderRequest::new("USD", "BTC", AmountSpec::InFiat(dec!(50)), "", "");

        let err = provider.get_quote(&quote).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);
        let err = provider.create_order(&order).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);

        provider.configure(mock_config()).unwrap();
        let err = provider.get_quote(&quote).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_order_lifecycle() {
        let mock = Arc::new(MockOnRampProvider::new());
        mock.configure(mock_config()).unwrap();

        let request = OrderRequest::new(
            "USD",
            "BTC",
            AmountSpec::InFiat(dec!(50)),
            "bc1q...",
            "https://cb",
        );
        let order = mock.create_order(&request).await.unwrap();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.provider_name, mock.provider_name());
        assert!(order.payment_url.is_some());

        assert!(mock.set_order_status(&order.order_id, OrderStatus::Completed));
        let current = mock.get_order_status(&order.order_id).await.unwrap();
        assert_eq!(current.status, OrderStatus::Completed);
        assert!(current.status.is_terminal());

        let err = mock.get_order_status("unknown").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_quote_invariants_hold() {
        let provider = adapter();
        for amount in [AmountSpec::InFiat(dec!(100)), AmountSpec::InCrypto(dec!(0.01))] {
            let quote = provider
                .get_quote(&QuoteRequest::new("USD", "BTC", amount))
                .await
                .unwrap();
            assert!(quote.total_fiat_amount >= quote.fiat_amount);
            let drift = (quote.total_fiat_amount - (quote.fiat_amount + quote.fee)).abs();
            assert!(drift <= quote.fiat_amount * dec!(0.01));
        }
    }

    #[tokio::test]
    async fn test_concurrent_status_lookups_agree() {
        let provider = adapter();
        let order = provider
            .create_order(&OrderRequest::new(
                "EUR",
                "ETH",
                AmountSpec::InCrypto(dec!(0.5)),
                "0xabc",
                "https://cb",
            ))
            .await
            .unwrap();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let provider = Arc::clone(&provider);
                let id = order.order_id.clone();
                tokio::spawn(async move { provider.get_order_status(&id).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }
        assert_eq!(results[0].order_id, results[1].order_id);
        assert_eq!(results[0].fiat_currency, results[1].fiat_currency);
        assert_eq!(results[0].crypto_currency, results[1].crypto_currency);
    }

    #[tokio::test]
    async fn test_failing_provider_surfaces_network_error() {
        let provider = MockOnRampProvider::failing("connection reset");
        provider.configure(mock_config()).unwrap();

        let err = provider.get_payment_methods("USD", "BTC").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NetworkError);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection reset"));
    }
}
