// 支付服务
// 负责支付合作方查询、交易记录创建和支付链接生成

use std::sync::Arc;
use anyhow::Result;
use crate::error::AppError;
use crate::messages::Messages;
use crate::models::{
    InsertOutcome, Partner, PartnerCode, PaymentRequest, RepeatLinkPolicy, Transaction,
    UrlGeneratorResponse,
};
use crate::repositories::{PartnerRepository, TransactionRepository};
use crate::services::PaymentGateway;
use crate::utils::{
    validate_currency, validate_payment_amount, validate_url, validate_username, InvoiceIdGenerator,
};

/// 支付服务
pub struct PaymentService {
    partners: Arc<dyn PartnerRepository>,
    transactions: Arc<dyn TransactionRepository>,
    gateway: Arc<dyn PaymentGateway>,
    id_generator: Arc<dyn InvoiceIdGenerator>,
    policy: RepeatLinkPolicy,
    messages: Messages,
}

impl PaymentService {
    /// 创建新的支付服务实例
    pub fn new(
        partners: Arc<dyn PartnerRepository>,
        transactions: Arc<dyn TransactionRepository>,
        gateway: Arc<dyn PaymentGateway>,
        id_generator: Arc<dyn InvoiceIdGenerator>,
        policy: RepeatLinkPolicy,
        messages: Messages,
    ) -> Self {
        Self {
            partners,
            transactions,
            gateway,
            id_generator,
            policy,
            messages,
        }
    }

    /// 根据代码查询支付合作方
    pub async fn find_by_code(&self, code: PartnerCode) -> Result<Option<Partner>> {
        self.partners.find_by_code(code).await
    }

    /// 获取全部支付合作方
    pub async fn find_all(&self) -> Result<Vec<Partner>> {
        self.partners.find_all().await
    }

    /// 查询用户的某笔交易
    pub async fn find_transaction(&self, transaction_id: &str, username: &str) -> Result<Option<Transaction>> {
        self.transactions
            .find_by_transaction_id_and_username(transaction_id, username)
            .await
    }

    /// 获取全部交易记录
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        self.transactions.find_all().await
    }

    /// 生成支付链接
    ///
    /// # Arguments
    /// * `request` - 支付请求
    ///
    /// # Returns
    /// * 成功时返回支付链接，合作方不存在或网关失败时返回带提示信息的失败结果。
    ///   只有请求校验失败和存储错误会以 `AppError` 返回。
    pub async fn generate_link(&self, mut request: PaymentRequest) -> Result<UrlGeneratorResponse, AppError> {
        request.currency = request.currency.trim().to_ascii_uppercase();
        Self::validate_request(&request).map_err(|e| AppError::Validation(e.to_string()))?;

        let code = request.partner_code;

        // 检查合作方是否存在
        let partner = match self.partners.find_by_code(code).await? {
            Some(partner) => partner,
            None => {
                log::warn!("[PaymentService] partner {} not found", code);
                return Ok(UrlGeneratorResponse::failed_with(
                    self.messages.partner_not_found(code.as_str()),
                ));
            }
        };

        let transaction_id = self.id_generator.generate(code);
        request.invoice_id = Some(transaction_id.clone());

        // 交易不存在时创建，(transaction_id, username) 唯一由存储层保证
        let transaction = Transaction::from_request(&partner, &transaction_id, &request);
        let outcome = self.transactions.insert_if_absent(&transaction).await?;

        match &outcome {
            InsertOutcome::Created(_) => {
                log::info!("[PaymentService] created transaction {} for user {}", transaction_id, request.username);
            }
            InsertOutcome::Existing(existing) => {
                log::info!("[PaymentService] transaction {} already exists for user {}", transaction_id, request.username);

                if self.policy == RepeatLinkPolicy::Reuse {
                    if let Some(url) = &existing.payment_url {
                        return Ok(UrlGeneratorResponse::create(url.clone()));
                    }
                }
            }
        }

        let response = self.get_payment_url(&partner, &request).await;

        if let Some(url) = response.url.as_deref().filter(|_| response.is_success) {
            self.transactions
                .attach_payment_url(&transaction_id, &request.username, url)
                .await?;
        }

        Ok(response)
    }

    /// 向网关获取支付链接，所有网关错误都转换为失败结果
    async fn get_payment_url(&self, partner: &Partner, request: &PaymentRequest) -> UrlGeneratorResponse {
        let code = request.partner_code.as_str();

        match self.gateway.get_payment_token(partner, request).await {
            Ok(token) if token.success => match token.web_payment_url {
                Some(url) => UrlGeneratorResponse::create(url),
                None => UrlGeneratorResponse::failed_with(self.messages.payment_redirect_failed(code)),
            },
            Ok(token) => {
                log::error!(
                    "[PaymentService] Cannot get payment token, reason: {}, error code: {}",
                    token.partner_desc, token.partner_code
                );
                UrlGeneratorResponse::failed_with(self.messages.payment_redirect_failed(code))
            }
            Err(e) => {
                log::error!("[PaymentService] get_payment_url -- exception: {}", e);
                UrlGeneratorResponse::failed_with(self.messages.partner_connection_failed(code))
            }
        }
    }

    /// 验证支付请求
    pub fn validate_request(request: &PaymentRequest) -> Result<()> {
        validate_username(&request.username)?;
        validate_currency(&request.currency)?;
        validate_payment_amount(&request.amount, &request.currency)?;

        if let Some(return_url) = &request.return_url {
            if !validate_url(return_url) {
                anyhow::bail!("Invalid return URL format");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Locale;
    use crate::models::PaymentTokenResponse;
    use crate::repositories::{InMemoryPartnerRepository, InMemoryTransactionRepository};
    use crate::repositories::in_memory::SeedData;
    use crate::services::GatewayError;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const FIXED_ID: &str = "VNPAY202610181200450000";

    /// 总是返回同一个ID
    struct FixedIdGenerator;

    impl InvoiceIdGenerator for FixedIdGenerator {
        fn generate(&self, _code: PartnerCode) -> String {
            FIXED_ID.to_string()
        }
    }

    enum Behavior {
        Issue,
        Refuse,
        Fail,
    }

    struct MockGateway {
        behavior: Behavior,
        calls: AtomicUsize,
        last_invoice: Mutex<Option<String>>,
    }

    impl MockGateway {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
                last_invoice: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn get_payment_token(
            &self,
            _partner: &Partner,
            request: &PaymentRequest,
        ) -> Result<PaymentTokenResponse, GatewayError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            *self.last_invoice.lock().unwrap() = request.invoice_id.clone();

            match self.behavior {
                Behavior::Issue => Ok(PaymentTokenResponse {
                    success: true,
                    partner_code: "00".to_string(),
                    partner_desc: "OK".to_string(),
                    web_payment_url: Some(format!("https://pay.example.com/session/{}", n)),
                    payment_token: Some(format!("tok-{}", n)),
                }),
                Behavior::Refuse => Ok(PaymentTokenResponse {
                    success: false,
                    partner_code: "91".to_string(),
                    partner_desc: "Merchant locked".to_string(),
                    ..Default::default()
                }),
                Behavior::Fail => Err(GatewayError::Status(503)),
            }
        }
    }

    struct Fixture {
        service: PaymentService,
        transactions: InMemoryTransactionRepository,
        gateway: Arc<MockGateway>,
    }

    fn fixture(behavior: Behavior, policy: RepeatLinkPolicy) -> Fixture {
        let transactions = InMemoryTransactionRepository::new();
        let gateway = MockGateway::new(behavior);
        let service = PaymentService::new(
            Arc::new(InMemoryPartnerRepository::with_partners(SeedData::demo().partners)),
            Arc::new(transactions.clone()),
            gateway.clone(),
            Arc::new(FixedIdGenerator),
            policy,
            Messages::new(Locale::Vi),
        );

        Fixture { service, transactions, gateway }
    }

    fn request(code: PartnerCode) -> PaymentRequest {
        PaymentRequest {
            partner_code: code,
            username: "nguyenvana".to_string(),
            amount: Decimal::new(150000, 0),
            currency: "VND".to_string(),
            order_info: "Thanh toán đơn hàng 42".to_string(),
            return_url: None,
            client_ip: None,
            invoice_id: None,
        }
    }

    #[tokio::test]
    async fn test_unknown_partner_returns_failure_without_write() {
        let f = fixture(Behavior::Issue, RepeatLinkPolicy::Reissue);

        for code in [PartnerCode::Momo, PartnerCode::Zalopay] {
            let response = f.service.generate_link(request(code)).await.unwrap();
            assert!(!response.is_success);
            assert_eq!(response.error_message, Some(format!("Không tìm thấy {}", code)));
        }

        assert_eq!(f.transactions.len().await, 0);
        assert_eq!(f.gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_new_transaction_gets_payment_url() {
        let f = fixture(Behavior::Issue, RepeatLinkPolicy::Reissue);

        let response = f.service.generate_link(request(PartnerCode::Vnpay)).await.unwrap();
        assert!(response.is_success);
        assert_eq!(response.url.as_deref(), Some("https://pay.example.com/session/1"));

        // 交易ID已附加到请求上
        assert_eq!(f.gateway.last_invoice.lock().unwrap().as_deref(), Some(FIXED_ID));

        let stored = f.transactions
            .find_by_transaction_id_and_username(FIXED_ID, "nguyenvana")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.partner_code, PartnerCode::Vnpay);
        assert_eq!(stored.amount, Decimal::new(150000, 0));
        assert_eq!(stored.payment_url.as_deref(), Some("https://pay.example.com/session/1"));
    }

    #[tokio::test]
    async fn test_repeated_call_creates_single_transaction_and_reissues() {
        let f = fixture(Behavior::Issue, RepeatLinkPolicy::Reissue);

        let first = f.service.generate_link(request(PartnerCode::Vnpay)).await.unwrap();
        let second = f.service.generate_link(request(PartnerCode::Vnpay)).await.unwrap();

        assert_eq!(f.transactions.len().await, 1);
        assert_eq!(f.gateway.calls(), 2);
        assert_eq!(first.url.as_deref(), Some("https://pay.example.com/session/1"));
        assert_eq!(second.url.as_deref(), Some("https://pay.example.com/session/2"));
    }

    #[tokio::test]
    async fn test_reuse_policy_returns_stored_url() {
        let f = fixture(Behavior::Issue, RepeatLinkPolicy::Reuse);

        let first = f.service.generate_link(request(PartnerCode::Vnpay)).await.unwrap();
        let second = f.service.generate_link(request(PartnerCode::Vnpay)).await.unwrap();

        assert_eq!(f.gateway.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(f.transactions.len().await, 1);
    }

    #[tokio::test]
    async fn test_reuse_policy_retries_when_no_url_was_stored() {
        let f = fixture(Behavior::Refuse, RepeatLinkPolicy::Reuse);

        f.service.generate_link(request(PartnerCode::Vnpay)).await.unwrap();
        f.service.generate_link(request(PartnerCode::Vnpay)).await.unwrap();

        assert_eq!(f.gateway.calls(), 2);
        assert_eq!(f.transactions.len().await, 1);
    }

    #[tokio::test]
    async fn test_refused_token_returns_failure_with_partner_name() {
        let f = fixture(Behavior::Refuse, RepeatLinkPolicy::Reissue);

        let response = f.service.generate_link(request(PartnerCode::Vnpay)).await.unwrap();
        assert!(!response.is_success);
        assert!(response.url.is_none());

        let message = response.error_message.unwrap();
        assert!(message.contains("VNPAY"));
        assert_eq!(message, "Không thể chuyển hướng thanh toán qua VNPAY");

        // 交易记录仍然保留，但没有支付链接
        let stored = f.transactions
            .find_by_transaction_id_and_username(FIXED_ID, "nguyenvana")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.payment_url.is_none());
    }

    #[tokio::test]
    async fn test_gateway_error_is_converted_to_failure() {
        let f = fixture(Behavior::Fail, RepeatLinkPolicy::Reissue);

        let response = f.service.generate_link(request(PartnerCode::Vnpay)).await.unwrap();
        assert!(!response.is_success);
        assert_eq!(
            response.error_message.as_deref(),
            Some("Có lỗi xảy ra trong quá trình kết nối với VNPAY")
        );
        assert_eq!(f.gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected() {
        let f = fixture(Behavior::Issue, RepeatLinkPolicy::Reissue);

        let mut bad_user = request(PartnerCode::Vnpay);
        bad_user.username = "  ".to_string();
        assert!(matches!(f.service.generate_link(bad_user).await, Err(AppError::Validation(_))));

        let mut bad_amount = request(PartnerCode::Vnpay);
        bad_amount.amount = Decimal::ZERO;
        assert!(matches!(f.service.generate_link(bad_amount).await, Err(AppError::Validation(_))));

        assert_eq!(f.transactions.len().await, 0);
        assert_eq!(f.gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_currency_is_checked_and_normalized() {
        let f = fixture(Behavior::Issue, RepeatLinkPolicy::Reissue);

        let mut long_currency = request(PartnerCode::Vnpay);
        long_currency.currency = "vnd-but-longer".to_string();
        long_currency.amount = Decimal::new(15, 1);
        assert!(PaymentService::validate_request(&long_currency).is_err());
        assert!(matches!(f.service.generate_link(long_currency).await, Err(AppError::Validation(_))));

        // 小写币种先规范化，VND 仍不允许小数
        let mut lower_fraction = request(PartnerCode::Vnpay);
        lower_fraction.currency = "vnd".to_string();
        lower_fraction.amount = Decimal::new(15, 1);
        assert!(matches!(f.service.generate_link(lower_fraction).await, Err(AppError::Validation(_))));

        let mut too_large = request(PartnerCode::Vnpay);
        too_large.amount = Decimal::new(10_000_000_000_000_000, 0);
        assert!(matches!(f.service.generate_link(too_large).await, Err(AppError::Validation(_))));

        assert_eq!(f.transactions.len().await, 0);
        assert_eq!(f.gateway.calls(), 0);

        let mut lower = request(PartnerCode::Vnpay);
        lower.currency = " vnd ".to_string();
        let response = f.service.generate_link(lower).await.unwrap();
        assert!(response.is_success);

        let stored = f.transactions
            .find_by_transaction_id_and_username(FIXED_ID, "nguyenvana")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.currency, "VND");
    }

    #[tokio::test]
    async fn test_find_partners() {
        let f = fixture(Behavior::Issue, RepeatLinkPolicy::Reissue);

        assert_eq!(f.service.find_all().await.unwrap().len(), 1);
        assert!(f.service.find_by_code(PartnerCode::Vnpay).await.unwrap().is_some());
        assert!(f.service.find_by_code(PartnerCode::Momo).await.unwrap().is_none());
    }
}
