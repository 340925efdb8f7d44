//! Tests for the facilitator dispatcher, the EVM verification pipeline and settlement

use super::*;
use crate::blockchain::{AuthorizedTransfer, ChainClient};
use crate::types::{parse_address, Authorization, ExactEvmPayload, InvalidReason};
use crate::wallet::Wallet;
use ethereum_types::{Address, H256, U256};
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;

const NETWORK: &str = "base-sepolia";
const CHAIN_ID: u64 = 84532;
const USDC: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";
const PAY_TO: &str = "0x209693Bc6afc0C5328bA36FaF03C514EF312287C";

enum Submit {
    Mined(H256),
    Fail,
    Hang,
}

struct MockChainClient {
    chain_id: u64,
    /// `None` makes `balanceOf` fail
    balance: Option<U256>,
    submit: Submit,
    submissions: Arc<Mutex<Vec<(Address, AuthorizedTransfer)>>>,
}

impl MockChainClient {
    fn with_balance(balance: u64) -> Self {
        Self {
            chain_id: CHAIN_ID,
            balance: Some(U256::from(balance)),
            submit: Submit::Mined(H256::repeat_byte(0xab)),
            submissions: Arc::default(),
        }
    }

    fn submitting(mut self, submit: Submit) -> Self {
        self.submit = submit;
        self
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn token_balance(&self, _token: Address, _owner: Address) -> Result<U256> {
        self.balance
            .ok_or_else(|| X402Error::rpc("execution reverted"))
    }

    async fn submit_authorized_transfer(
        &self,
        token: Address,
        transfer: &AuthorizedTransfer,
        _signer: &PrivateKeySigner,
    ) -> Result<H256> {
        match self.submit {
            Submit::Mined(hash) => {
                self.submissions.lock().unwrap().push((token, *transfer));
                Ok(hash)
            }
            Submit::Fail => Err(X402Error::rpc("replacement transaction underpriced")),
            Submit::Hang => std::future::pending().await,
        }
    }
}

fn registry() -> Arc<ChainRegistry> {
    Arc::new(ChainRegistry::builtin())
}

fn facilitator(client: MockChainClient) -> EvmFacilitator<MockChainClient> {
    EvmFacilitator::with_chain_id(client, PrivateKeySigner::random(), NETWORK, CHAIN_ID, registry())
}

fn requirements(amount: &str) -> PaymentRequirements {
    PaymentRequirements::new(
        "evm",
        NETWORK,
        amount,
        USDC,
        PAY_TO,
        "https://api.example.com/premium",
        "Premium data",
    )
}

fn wallet() -> Wallet {
    Wallet::new(PrivateKeySigner::random(), registry())
}

fn signed(wallet: &Wallet, authorization: &Authorization) -> PaymentPayload {
    let payload = wallet
        .sign_authorization(authorization, NETWORK, USDC)
        .unwrap();
    PaymentPayload::from_evm("evm", NETWORK, &payload).unwrap()
}

fn payer_of(wallet: &Wallet) -> Option<String> {
    Some(format!("{:#x}", wallet.address()))
}

/// Rewrite the wire payload in place
fn edit_payload(payment: &mut PaymentPayload, edit: impl FnOnce(&mut ExactEvmPayload)) {
    let mut evm = payment.evm_payload().unwrap();
    edit(&mut evm);
    payment.payload = serde_json::to_value(&evm).unwrap();
}

fn now() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

async fn verify_with(
    facilitator: &EvmFacilitator<MockChainClient>,
    payment: &PaymentPayload,
    requirements: &PaymentRequirements,
) -> VerifyResponse {
    facilitator
        .verify(&RequestContext::new(), payment, requirements)
        .await
        .unwrap()
}

#[test]
fn test_scheme_names() {
    assert_eq!("evm".parse::<Scheme>().unwrap(), Scheme::Evm);
    assert_eq!("solana".parse::<Scheme>().unwrap(), Scheme::Solana);
    assert_eq!("sui".parse::<Scheme>().unwrap(), Scheme::Sui);
    assert_eq!("tron".parse::<Scheme>().unwrap(), Scheme::Tron);
    assert_eq!(Scheme::Tron.to_string(), "tron");

    let err = "bitcoin".parse::<Scheme>().unwrap_err();
    assert!(matches!(err, X402Error::Config { .. }));
}

#[tokio::test]
async fn test_verify_valid_payment() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();

    let response = verify_with(&facilitator(MockChainClient::with_balance(10000)), &payment, &requirements).await;

    assert!(response.is_valid);
    assert_eq!(response.invalid_reason, None);
    assert_eq!(response.payer, payer_of(&wallet));
}

#[tokio::test]
async fn test_verify_token_symbol_as_asset() {
    let wallet = wallet();
    let mut requirements = requirements("10000");
    requirements.asset = "usdc".to_string();
    let payment = wallet.create_payment_payload(&requirements).unwrap();

    let response = verify_with(&facilitator(MockChainClient::with_balance(10000)), &payment, &requirements).await;
    assert!(response.is_valid);
}

#[tokio::test]
async fn test_verify_undecodable_payload() {
    let payment = PaymentPayload::new("evm", NETWORK, json!({ "signature": 42 }));

    let response = verify_with(&facilitator(MockChainClient::with_balance(10000)), &payment, &requirements("10000")).await;

    assert!(!response.is_valid);
    assert_eq!(response.invalid_reason, Some(InvalidReason::InvalidPayloadFormat));
    assert_eq!(response.payer, None);
}

#[tokio::test]
async fn test_verify_scheme_checked_before_signature() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let mut payment = wallet.create_payment_payload(&requirements).unwrap();
    payment.scheme = "solana".to_string();
    edit_payload(&mut payment, |evm| evm.signature.truncate(128));

    let response = verify_with(&facilitator(MockChainClient::with_balance(10000)), &payment, &requirements).await;

    assert_eq!(response.invalid_reason, Some(InvalidReason::IncompatiblePayloadScheme));
    assert_eq!(response.payer, payer_of(&wallet));
}

#[tokio::test]
async fn test_verify_requirements_scheme_mismatch() {
    let wallet = wallet();
    let mut requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    requirements.scheme = "exact".to_string();

    let response = verify_with(&facilitator(MockChainClient::with_balance(10000)), &payment, &requirements).await;
    assert_eq!(response.invalid_reason, Some(InvalidReason::IncompatiblePayloadScheme));
}

#[tokio::test]
async fn test_verify_network_mismatch() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let mut payment = wallet.create_payment_payload(&requirements).unwrap();
    payment.network = "ethereum".to_string();

    let response = verify_with(&facilitator(MockChainClient::with_balance(10000)), &payment, &requirements).await;
    assert_eq!(response.invalid_reason, Some(InvalidReason::NetworkMismatch));
}

#[tokio::test]
async fn test_verify_node_on_wrong_chain() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    let facilitator = EvmFacilitator::with_chain_id(
        MockChainClient::with_balance(10000),
        PrivateKeySigner::random(),
        NETWORK,
        1,
        registry(),
    );

    let response = verify_with(&facilitator, &payment, &requirements).await;
    assert_eq!(response.invalid_reason, Some(InvalidReason::NetworkIdMismatch));
}

#[tokio::test]
async fn test_verify_network_not_in_registry() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let mut payment = wallet.create_payment_payload(&requirements).unwrap();
    payment.network = "zksync".to_string();
    let facilitator = EvmFacilitator::with_chain_id(
        MockChainClient::with_balance(10000),
        PrivateKeySigner::random(),
        "zksync",
        324,
        registry(),
    );

    let response = verify_with(&facilitator, &payment, &requirements).await;
    assert_eq!(response.invalid_reason, Some(InvalidReason::InvalidNetwork));
}

#[tokio::test]
async fn test_verify_unknown_token() {
    let wallet = wallet();
    let mut requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    requirements.asset = "0x000000000000000000000000000000000000dEaD".to_string();

    let response = verify_with(&facilitator(MockChainClient::with_balance(10000)), &payment, &requirements).await;
    assert_eq!(response.invalid_reason, Some(InvalidReason::TokenMismatch));
}

#[tokio::test]
async fn test_verify_truncated_signature() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let mut payment = wallet.create_payment_payload(&requirements).unwrap();
    edit_payload(&mut payment, |evm| evm.signature.truncate(128));

    let response = verify_with(&facilitator(MockChainClient::with_balance(10000)), &payment, &requirements).await;
    assert_eq!(response.invalid_reason, Some(InvalidReason::InvalidSignature));
}

#[tokio::test]
async fn test_verify_signature_from_someone_else() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let mut payment = wallet.create_payment_payload(&requirements).unwrap();
    let victim = "0x857b06519e91e3a54538791bdbb0e22373e36b66";
    edit_payload(&mut payment, |evm| evm.authorization.from = victim.to_string());

    let response = verify_with(&facilitator(MockChainClient::with_balance(10000)), &payment, &requirements).await;

    assert_eq!(response.invalid_reason, Some(InvalidReason::InvalidSignature));
    assert_eq!(response.payer.as_deref(), Some(victim));
}

#[tokio::test]
async fn test_verify_tampered_value() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let mut payment = wallet.create_payment_payload(&requirements).unwrap();
    edit_payload(&mut payment, |evm| evm.authorization.value = "1".to_string());

    let response = verify_with(&facilitator(MockChainClient::with_balance(10000)), &payment, &requirements).await;
    assert_eq!(response.invalid_reason, Some(InvalidReason::InvalidSignature));
}

#[tokio::test]
async fn test_verify_insufficient_balance() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();

    let response = verify_with(&facilitator(MockChainClient::with_balance(9999)), &payment, &requirements).await;
    assert_eq!(response.invalid_reason, Some(InvalidReason::InsufficientBalance));
}

#[tokio::test]
async fn test_verify_balance_rpc_failure_is_an_error() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    let mut client = MockChainClient::with_balance(0);
    client.balance = None;

    let err = facilitator(client)
        .verify(&RequestContext::new(), &payment, &requirements)
        .await
        .unwrap_err();
    assert!(matches!(err, X402Error::Rpc { .. }));
}

#[tokio::test]
async fn test_verify_cancelled_request() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    let ctx = RequestContext::new();
    ctx.cancel();

    let err = facilitator(MockChainClient::with_balance(10000))
        .verify(&ctx, &payment, &requirements)
        .await
        .unwrap_err();
    assert!(matches!(err, X402Error::Cancelled));
}

#[tokio::test]
async fn test_validity_window_policy() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let policy = VerificationPolicy {
        enforce_validity_window: true,
        ..Default::default()
    };

    let mut future = wallet.authorization(parse_address(PAY_TO).unwrap(), U256::from(10000));
    future.valid_after = U256::from(now() + 600);
    future.valid_before = U256::from(now() + 1200);
    let future = signed(&wallet, &future);

    let mut expired = wallet.authorization(parse_address(PAY_TO).unwrap(), U256::from(10000));
    expired.valid_after = U256::from(now() - 1200);
    expired.valid_before = U256::from(now() - 600);
    let expired = signed(&wallet, &expired);

    // Without the policy the window is left to the token contract
    let lenient = facilitator(MockChainClient::with_balance(10000));
    assert!(verify_with(&lenient, &future, &requirements).await.is_valid);
    assert!(verify_with(&lenient, &expired, &requirements).await.is_valid);

    let strict = facilitator(MockChainClient::with_balance(10000)).with_policy(policy);
    assert_eq!(
        verify_with(&strict, &future, &requirements).await.invalid_reason,
        Some(InvalidReason::AuthorizationNotYetValid)
    );
    assert_eq!(
        verify_with(&strict, &expired, &requirements).await.invalid_reason,
        Some(InvalidReason::AuthorizationExpired)
    );
}

#[tokio::test]
async fn test_recipient_policy() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let authorization = wallet.authorization(Address::repeat_byte(0x77), U256::from(10000));
    let payment = signed(&wallet, &authorization);

    let lenient = facilitator(MockChainClient::with_balance(10000));
    assert!(verify_with(&lenient, &payment, &requirements).await.is_valid);

    let strict = facilitator(MockChainClient::with_balance(10000)).with_policy(VerificationPolicy {
        enforce_recipient: true,
        ..Default::default()
    });
    assert_eq!(
        verify_with(&strict, &payment, &requirements).await.invalid_reason,
        Some(InvalidReason::RecipientMismatch)
    );
}

#[tokio::test]
async fn test_exact_amount_policy() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let authorization = wallet.authorization(parse_address(PAY_TO).unwrap(), U256::from(20000));
    let payment = signed(&wallet, &authorization);

    let strict = facilitator(MockChainClient::with_balance(50000)).with_policy(VerificationPolicy {
        enforce_exact_amount: true,
        ..Default::default()
    });
    assert_eq!(
        verify_with(&strict, &payment, &requirements).await.invalid_reason,
        Some(InvalidReason::AmountMismatch)
    );

    let exact = wallet.create_payment_payload(&requirements).unwrap();
    assert!(verify_with(&strict, &exact, &requirements).await.is_valid);
}

#[tokio::test]
async fn test_gas_threshold_policy() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();

    let strict = facilitator(MockChainClient::with_balance(10000)).with_policy(VerificationPolicy {
        min_amount: Some(U256::from(1_000_000)),
        ..Default::default()
    });
    assert_eq!(
        verify_with(&strict, &payment, &requirements).await.invalid_reason,
        Some(InvalidReason::AmountBelowGasThreshold)
    );
}

#[tokio::test]
async fn test_settle_success() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    let client = MockChainClient::with_balance(10000);
    let submissions = client.submissions.clone();

    let response = facilitator(client)
        .settle(&RequestContext::new(), &payment, &requirements)
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.error, None);
    assert_eq!(
        response.tx_hash.as_deref(),
        Some(format!("0x{}", "ab".repeat(32)).as_str())
    );
    assert_eq!(response.network_id.as_deref(), Some("84532"));

    let submissions = submissions.lock().unwrap();
    assert_eq!(submissions.len(), 1);
    let (token, transfer) = &submissions[0];
    assert_eq!(*token, parse_address(USDC).unwrap());
    assert_eq!(transfer.authorization.from, wallet.address());
    assert_eq!(transfer.authorization.value, U256::from(10000));
    assert!(transfer.v == 27 || transfer.v == 28);
}

#[tokio::test]
async fn test_settle_undecodable_payload() {
    let payment = PaymentPayload::new("evm", NETWORK, json!({}));
    let response = facilitator(MockChainClient::with_balance(10000))
        .settle(&RequestContext::new(), &payment, &requirements("10000"))
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response
        .error
        .unwrap()
        .starts_with("invalid payload format"));
}

#[tokio::test]
async fn test_settle_wrong_network_submits_nothing() {
    let wallet = wallet();
    let mut requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    requirements.network = "base".to_string();
    let client = MockChainClient::with_balance(10000);
    let submissions = client.submissions.clone();

    let response = facilitator(client)
        .settle(&RequestContext::new(), &payment, &requirements)
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response.error.unwrap().contains("network mismatch"));
    assert!(submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_settle_payment_for_other_network_submits_nothing() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let mut payment = wallet.create_payment_payload(&requirements).unwrap();
    payment.network = "base".to_string();
    let client = MockChainClient::with_balance(10000);
    let submissions = client.submissions.clone();

    let response = facilitator(client)
        .settle(&RequestContext::new(), &payment, &requirements)
        .await
        .unwrap();

    assert!(!response.success);
    let error = response.error.unwrap();
    assert!(error.contains("network mismatch"), "{error}");
    assert!(error.contains("'base'"), "{error}");
    assert!(submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_settle_submission_failure() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();

    let response = facilitator(MockChainClient::with_balance(10000).submitting(Submit::Fail))
        .settle(&RequestContext::new(), &payment, &requirements)
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response.error.unwrap().contains("underpriced"));
    assert_eq!(response.tx_hash, None);
}

#[tokio::test]
async fn test_settle_unreachable_node() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    let client = RpcChainClient::new("http://127.0.0.1:1").unwrap();
    let facilitator =
        EvmFacilitator::with_chain_id(client, PrivateKeySigner::random(), NETWORK, CHAIN_ID, registry());

    let response = facilitator
        .settle(&RequestContext::with_timeout(Duration::from_secs(10)), &payment, &requirements)
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response.error.is_some());
}

#[tokio::test]
async fn test_settle_cancelled_mid_submission() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    let facilitator = facilitator(MockChainClient::with_balance(10000).submitting(Submit::Hang));

    let ctx = RequestContext::new();
    let token = ctx.cancellation_token().clone();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = facilitator
        .settle(&ctx, &payment, &requirements)
        .await
        .unwrap_err();
    assert!(matches!(err, X402Error::Cancelled));
    canceller.await.unwrap();
}

#[tokio::test]
async fn test_settle_deadline() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    let facilitator = facilitator(MockChainClient::with_balance(10000).submitting(Submit::Hang));

    let err = facilitator
        .settle(&RequestContext::with_timeout(Duration::from_millis(20)), &payment, &requirements)
        .await
        .unwrap_err();
    assert!(matches!(err, X402Error::Timeout));
}

#[tokio::test]
async fn test_replay_guard() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    let storage = Arc::new(InMemoryStorage::new());
    let facilitator = facilitator(MockChainClient::with_balance(10000)).with_nonce_storage(storage.clone());
    let ctx = RequestContext::new();

    assert!(verify_with(&facilitator, &payment, &requirements).await.is_valid);
    assert!(facilitator.settle(&ctx, &payment, &requirements).await.unwrap().success);
    assert_eq!(storage.len().await, 1);

    assert_eq!(
        verify_with(&facilitator, &payment, &requirements).await.invalid_reason,
        Some(InvalidReason::NonceAlreadyUsed)
    );
    let again = facilitator.settle(&ctx, &payment, &requirements).await.unwrap();
    assert!(!again.success);
    assert_eq!(again.error.as_deref(), Some("nonce_already_used"));
}

#[tokio::test]
async fn test_failed_settlement_does_not_burn_nonce() {
    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    let storage = Arc::new(InMemoryStorage::new());
    let facilitator = facilitator(MockChainClient::with_balance(10000).submitting(Submit::Fail))
        .with_nonce_storage(storage.clone());

    let response = facilitator
        .settle(&RequestContext::new(), &payment, &requirements)
        .await
        .unwrap();
    assert!(!response.success);
    assert!(storage.is_empty().await);
}

#[test]
fn test_evm_supported_kinds() {
    let kinds = facilitator(MockChainClient::with_balance(0)).supported().kinds;
    assert_eq!(kinds.len(), 1);
    assert_eq!(kinds[0].x402_version, 1);
    assert_eq!(kinds[0].scheme, "evm");
    assert_eq!(kinds[0].network, NETWORK);
}

#[tokio::test]
async fn test_connect_learns_chain_id() {
    let facilitator = EvmFacilitator::connect(
        MockChainClient::with_balance(0),
        PrivateKeySigner::random(),
        NETWORK,
        registry(),
    )
    .await
    .unwrap();
    assert_eq!(facilitator.chain_id(), CHAIN_ID);
    assert_eq!(facilitator.network(), NETWORK);
}

#[tokio::test]
async fn test_connect_rejects_unknown_network() {
    let err = EvmFacilitator::connect(
        MockChainClient::with_balance(0),
        PrivateKeySigner::random(),
        "not-a-chain",
        registry(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, X402Error::Registry(_)));
}

#[tokio::test]
async fn test_connect_to_node_on_other_chain() {
    let mut client = MockChainClient::with_balance(10000);
    client.chain_id = 8453;
    let facilitator = EvmFacilitator::connect(client, PrivateKeySigner::random(), NETWORK, registry())
        .await
        .unwrap();
    assert_eq!(facilitator.chain_id(), 8453);

    let wallet = wallet();
    let requirements = requirements("10000");
    let payment = wallet.create_payment_payload(&requirements).unwrap();
    assert_eq!(
        verify_with(&facilitator, &payment, &requirements).await.invalid_reason,
        Some(InvalidReason::NetworkIdMismatch)
    );
}

#[tokio::test]
async fn test_unsupported_scheme_refuses_operations() {
    let facilitator = UnsupportedFacilitator::new(Scheme::Solana, "solana-devnet");
    let payment = PaymentPayload::new("solana", "solana-devnet", json!({}));
    let requirements = requirements("10000");
    let ctx = RequestContext::new();

    let err = facilitator.verify(&ctx, &payment, &requirements).await.unwrap_err();
    assert!(matches!(
        err,
        X402Error::NotImplemented { ref scheme, operation: "verify" } if scheme == "solana"
    ));
    let err = facilitator.settle(&ctx, &payment, &requirements).await.unwrap_err();
    assert!(matches!(err, X402Error::NotImplemented { operation: "settle", .. }));

    let kinds = facilitator.supported().kinds;
    assert_eq!(kinds[0].scheme, "solana");
    assert_eq!(kinds[0].network, "solana-devnet");
}

#[tokio::test]
async fn test_build_facilitator_for_scheme_without_backend() {
    let settings = FacilitatorSettings::new(Scheme::Tron, "tron-mainnet", "unused");
    let facilitator = build_facilitator(&settings, registry()).await.unwrap();

    assert_eq!(facilitator.supported().kinds[0].scheme, "tron");
    let err = facilitator
        .verify(
            &RequestContext::new(),
            &PaymentPayload::new("tron", "tron-mainnet", json!({})),
            &requirements("1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, X402Error::NotImplemented { .. }));
}

#[tokio::test]
async fn test_build_facilitator_rejects_bad_key() {
    let settings = FacilitatorSettings::new(Scheme::Evm, NETWORK, "0x1234");
    // `Arc<dyn Facilitator>` has no Debug, so no `unwrap_err` here
    match build_facilitator(&settings, registry()).await {
        Err(err) => assert!(matches!(err, X402Error::Signature(_)), "{err}"),
        Ok(_) => panic!("expected an invalid key error"),
    }
}
