//! The checkout orchestrator.
//!
//! Validates and prices a checkout request, runs the payment checks for the
//! gateway path, and hands the priced draft to the store for the one
//! transaction that reserves stock, persists the order, and clears the
//! cart. Also owns the post-commit fan-out for order-status changes.

use std::collections::BTreeSet;
use std::sync::Arc;

use bigdecimal::{BigDecimal, ToPrimitive};
use serde_json::json;
use uuid::Uuid;

use crate::domain::errors::CheckoutError;
use crate::domain::order::{
    status_message, CheckoutLine, NotificationView, OrderDraft, OrderStatus, OrderView,
    PaymentDetails, PricedLine,
};
use crate::domain::ports::{CheckoutStore, LivePush};
use crate::payment::SignatureVerifier;

/// A priced checkout, in both display and gateway (minor) units.
#[derive(Debug, Clone)]
pub struct CheckoutQuote {
    pub total: BigDecimal,
    pub amount_minor: i64,
}

/// Everything the gateway-verified checkout path needs from the client.
#[derive(Debug, Clone)]
pub struct GatewayCheckout {
    pub lines: Vec<CheckoutLine>,
    pub declared_amount_minor: i64,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
    pub shipping_address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct CheckoutService<S> {
    store: S,
    verifier: SignatureVerifier,
    push: Arc<dyn LivePush>,
}

impl<S: CheckoutStore> CheckoutService<S> {
    pub fn new(store: S, verifier: SignatureVerifier, push: Arc<dyn LivePush>) -> Self {
        Self {
            store,
            verifier,
            push,
        }
    }

    fn validate_lines(lines: &[CheckoutLine]) -> Result<(), CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::InvalidPayload(
                "orders payload required".to_string(),
            ));
        }
        for line in lines {
            if line.quantity < 1 {
                return Err(CheckoutError::InvalidPayload(format!(
                    "quantity must be at least 1 for product {}",
                    line.product_id
                )));
            }
            if line.size.trim().is_empty() {
                return Err(CheckoutError::InvalidPayload(format!(
                    "size is required for product {}",
                    line.product_id
                )));
            }
        }
        Ok(())
    }

    /// Validate the lines, resolve every product in one batch, and price
    /// each line at the current catalog price. No side effects.
    fn price_lines(
        &self,
        lines: &[CheckoutLine],
    ) -> Result<(Vec<PricedLine>, BigDecimal), CheckoutError> {
        Self::validate_lines(lines)?;

        let ids: Vec<Uuid> = lines
            .iter()
            .map(|l| l.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let products = self.store.load_products(&ids)?;

        let mut priced = Vec::with_capacity(lines.len());
        let mut total = BigDecimal::from(0);
        for line in lines {
            let product = products
                .get(&line.product_id)
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;
            total += product.price.clone() * BigDecimal::from(line.quantity);
            priced.push(PricedLine {
                product_id: line.product_id,
                size: line.size.clone(),
                quantity: line.quantity,
                unit_price: product.price.clone(),
            });
        }
        Ok((priced, total))
    }

    /// Price a line list for the gateway's order-creation call.
    pub fn quote(&self, lines: &[CheckoutLine]) -> Result<CheckoutQuote, CheckoutError> {
        let (_, total) = self.price_lines(lines)?;
        let amount_minor = to_minor_units(&total)?;
        Ok(CheckoutQuote {
            total,
            amount_minor,
        })
    }

    /// Cash-on-delivery checkout: no payment verification, order starts
    /// with payment PENDING.
    pub fn checkout_cod(
        &self,
        user_id: Uuid,
        lines: Vec<CheckoutLine>,
        shipping_address: Option<String>,
        phone: Option<String>,
    ) -> Result<OrderView, CheckoutError> {
        let (priced, total) = self.price_lines(&lines)?;
        self.store.create_order(
            user_id,
            OrderDraft {
                lines: priced,
                total_amount: total,
                shipping_address,
                phone,
            },
            PaymentDetails::CashOnDelivery,
        )
    }

    /// Gateway-verified checkout. The amount check and the signature check
    /// both run before any database mutation; a wrong amount is rejected
    /// without even looking at the signature.
    pub fn checkout_gateway(
        &self,
        user_id: Uuid,
        checkout: GatewayCheckout,
    ) -> Result<OrderView, CheckoutError> {
        let (priced, total) = self.price_lines(&checkout.lines)?;

        let expected_minor = to_minor_units(&total)?;
        if checkout.declared_amount_minor != expected_minor {
            return Err(CheckoutError::AmountMismatch {
                declared: checkout.declared_amount_minor,
                expected: expected_minor,
            });
        }

        self.verifier.verify(
            &checkout.gateway_order_id,
            &checkout.gateway_payment_id,
            &checkout.gateway_signature,
        )?;

        self.store.create_order(
            user_id,
            OrderDraft {
                lines: priced,
                total_amount: total,
                shipping_address: checkout.shipping_address,
                phone: checkout.phone,
            },
            PaymentDetails::GatewayVerified {
                gateway_order_id: checkout.gateway_order_id,
                gateway_payment_id: checkout.gateway_payment_id,
                gateway_signature: checkout.gateway_signature,
            },
        )
    }

    pub fn my_orders(&self, user_id: Uuid) -> Result<Vec<OrderView>, CheckoutError> {
        self.store.list_orders(user_id)
    }

    pub fn order(&self, user_id: Uuid, order_id: Uuid) -> Result<OrderView, CheckoutError> {
        self.store
            .find_order(user_id, order_id)?
            .ok_or(CheckoutError::OrderNotFound)
    }

    pub fn update_address(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        shipping_address: &str,
    ) -> Result<OrderView, CheckoutError> {
        if shipping_address.trim().is_empty() {
            return Err(CheckoutError::InvalidPayload(
                "shipping_address required".to_string(),
            ));
        }
        self.store
            .update_shipping_address(user_id, order_id, shipping_address)
    }

    /// Admin status update. The store writes the status and, on an actual
    /// change, the inbox notification in one transaction; the live push
    /// happens here, after commit, and is fire-and-forget.
    pub fn set_order_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderView, CheckoutError> {
        let transition = self.store.update_order_status(order_id, status)?;
        if transition.changed() {
            self.push.publish(
                transition.order.user_id,
                json!({
                    "type": "order_status",
                    "order_id": transition.order.id,
                    "order_status": transition.current.as_str(),
                    "message": status_message(transition.order.id, transition.current),
                }),
            );
        }
        Ok(transition.order)
    }

    pub fn notifications(&self, user_id: Uuid) -> Result<Vec<NotificationView>, CheckoutError> {
        self.store.list_notifications(user_id)
    }

    pub fn mark_notifications_read(
        &self,
        user_id: Uuid,
        notification_id: Option<Uuid>,
    ) -> Result<usize, CheckoutError> {
        self.store
            .mark_notifications_read(user_id, notification_id)
    }
}

fn to_minor_units(total: &BigDecimal) -> Result<i64, CheckoutError> {
    (total * BigDecimal::from(100))
        .with_scale(0)
        .to_i64()
        .ok_or_else(|| CheckoutError::Internal(format!("total {} out of range", total)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Mutex;

    use chrono::Utc;
    use serde_json::Value;

    use super::*;
    use crate::domain::order::{ProductInfo, StatusTransition};
    use crate::domain::ports::CheckoutStore;

    const SECRET: &str = "test-secret";

    #[derive(Clone)]
    struct FakeStore {
        products: HashMap<Uuid, ProductInfo>,
        created: Arc<Mutex<Vec<(Uuid, OrderDraft, PaymentDetails)>>>,
        order_status: Arc<Mutex<OrderStatus>>,
        notifications: Arc<Mutex<Vec<String>>>,
    }

    impl Default for FakeStore {
        fn default() -> Self {
            Self {
                products: HashMap::new(),
                created: Arc::default(),
                order_status: Arc::new(Mutex::new(OrderStatus::Processing)),
                notifications: Arc::default(),
            }
        }
    }

    impl FakeStore {
        fn with_product(price: &str) -> (Self, Uuid) {
            let id = Uuid::new_v4();
            let mut products = HashMap::new();
            products.insert(
                id,
                ProductInfo {
                    id,
                    name: "Floral midi dress".to_string(),
                    price: BigDecimal::from_str(price).unwrap(),
                },
            );
            (
                Self {
                    products,
                    ..Default::default()
                },
                id,
            )
        }

        fn created_count(&self) -> usize {
            self.created.lock().unwrap().len()
        }
    }

    fn order_view(user_id: Uuid, status: OrderStatus) -> OrderView {
        OrderView {
            id: Uuid::new_v4(),
            user_id,
            total_amount: BigDecimal::from(0),
            payment_status: crate::domain::order::PaymentStatus::Pending,
            order_status: status,
            gateway_order_id: None,
            gateway_payment_id: None,
            shipping_address: None,
            phone: None,
            created_at: Utc::now(),
            items: vec![],
        }
    }

    impl CheckoutStore for FakeStore {
        fn load_products(
            &self,
            ids: &[Uuid],
        ) -> Result<HashMap<Uuid, ProductInfo>, CheckoutError> {
            Ok(ids
                .iter()
                .filter_map(|id| self.products.get(id).cloned().map(|p| (*id, p)))
                .collect())
        }

        fn create_order(
            &self,
            user_id: Uuid,
            draft: OrderDraft,
            payment: PaymentDetails,
        ) -> Result<OrderView, CheckoutError> {
            let mut view = order_view(user_id, OrderStatus::Processing);
            view.total_amount = draft.total_amount.clone();
            self.created
                .lock()
                .unwrap()
                .push((user_id, draft, payment));
            Ok(view)
        }

        fn list_orders(&self, _user_id: Uuid) -> Result<Vec<OrderView>, CheckoutError> {
            Ok(vec![])
        }

        fn find_order(
            &self,
            _user_id: Uuid,
            _order_id: Uuid,
        ) -> Result<Option<OrderView>, CheckoutError> {
            Ok(None)
        }

        fn update_shipping_address(
            &self,
            user_id: Uuid,
            _order_id: Uuid,
            address: &str,
        ) -> Result<OrderView, CheckoutError> {
            let mut view = order_view(user_id, *self.order_status.lock().unwrap());
            view.shipping_address = Some(address.to_string());
            Ok(view)
        }

        fn update_order_status(
            &self,
            order_id: Uuid,
            status: OrderStatus,
        ) -> Result<StatusTransition, CheckoutError> {
            let mut current = self.order_status.lock().unwrap();
            let previous = *current;
            *current = status;
            if previous != status {
                self.notifications
                    .lock()
                    .unwrap()
                    .push(status_message(order_id, status));
            }
            let mut order = order_view(Uuid::new_v4(), status);
            order.id = order_id;
            Ok(StatusTransition {
                order,
                previous,
                current: status,
            })
        }

        fn list_notifications(
            &self,
            _user_id: Uuid,
        ) -> Result<Vec<NotificationView>, CheckoutError> {
            Ok(vec![])
        }

        fn mark_notifications_read(
            &self,
            _user_id: Uuid,
            _notification_id: Option<Uuid>,
        ) -> Result<usize, CheckoutError> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct RecordingPush {
        published: Mutex<Vec<(Uuid, Value)>>,
    }

    impl LivePush for RecordingPush {
        fn publish(&self, user_id: Uuid, payload: Value) {
            self.published.lock().unwrap().push((user_id, payload));
        }
    }

    fn service(store: FakeStore) -> (CheckoutService<FakeStore>, FakeStore, Arc<RecordingPush>) {
        let push = Arc::new(RecordingPush::default());
        let svc = CheckoutService::new(
            store.clone(),
            SignatureVerifier::new(SECRET),
            push.clone(),
        );
        (svc, store, push)
    }

    fn line(product_id: Uuid, quantity: i32) -> CheckoutLine {
        CheckoutLine {
            product_id,
            size: "M".to_string(),
            quantity,
        }
    }

    #[test]
    fn rejects_empty_line_list() {
        let (svc, store, _) = service(FakeStore::default());
        let err = svc.checkout_cod(Uuid::new_v4(), vec![], None, None).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPayload(_)));
        assert_eq!(store.created_count(), 0);
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let (store, product) = FakeStore::with_product("500.00");
        let (svc, store, _) = service(store);
        let err = svc
            .checkout_cod(Uuid::new_v4(), vec![line(product, 0)], None, None)
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPayload(_)));
        assert_eq!(store.created_count(), 0);
    }

    #[test]
    fn rejects_blank_size() {
        let (store, product) = FakeStore::with_product("500.00");
        let (svc, store, _) = service(store);
        let mut bad = line(product, 1);
        bad.size = "  ".to_string();
        let err = svc
            .checkout_cod(Uuid::new_v4(), vec![bad], None, None)
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPayload(_)));
        assert_eq!(store.created_count(), 0);
    }

    #[test]
    fn rejects_unknown_product_before_any_side_effect() {
        let (svc, store, _) = service(FakeStore::default());
        let missing = Uuid::new_v4();
        let err = svc
            .checkout_cod(Uuid::new_v4(), vec![line(missing, 1)], None, None)
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound(id) if id == missing));
        assert_eq!(store.created_count(), 0);
    }

    #[test]
    fn cod_prices_lines_at_catalog_price() {
        let (store, product) = FakeStore::with_product("500.00");
        let (svc, store, _) = service(store);

        let order = svc
            .checkout_cod(Uuid::new_v4(), vec![line(product, 2)], None, None)
            .unwrap();

        assert_eq!(order.total_amount, BigDecimal::from_str("1000.00").unwrap());
        let created = store.created.lock().unwrap();
        let (_, draft, payment) = &created[0];
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.lines[0].unit_price, BigDecimal::from_str("500.00").unwrap());
        assert!(matches!(payment, PaymentDetails::CashOnDelivery));
    }

    #[test]
    fn quote_converts_total_to_minor_units() {
        let (store, product) = FakeStore::with_product("499.50");
        let (svc, _, _) = service(store);

        let quote = svc.quote(&[line(product, 2)]).unwrap();

        assert_eq!(quote.total, BigDecimal::from_str("999.00").unwrap());
        assert_eq!(quote.amount_minor, 99_900);
    }

    fn gateway_checkout(product: Uuid, amount_minor: i64, signature: String) -> GatewayCheckout {
        GatewayCheckout {
            lines: vec![line(product, 2)],
            declared_amount_minor: amount_minor,
            gateway_order_id: "order_G1".to_string(),
            gateway_payment_id: "pay_G1".to_string(),
            gateway_signature: signature,
            shipping_address: Some("12 Main St".to_string()),
            phone: None,
        }
    }

    #[test]
    fn amount_mismatch_is_checked_before_the_signature() {
        let (store, product) = FakeStore::with_product("500.00");
        let (svc, store, _) = service(store);

        // Signature is garbage; the wrong amount must win regardless.
        let err = svc
            .checkout_gateway(
                Uuid::new_v4(),
                gateway_checkout(product, 99_999, "bogus".to_string()),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::AmountMismatch {
                declared: 99_999,
                expected: 100_000
            }
        ));
        assert_eq!(store.created_count(), 0);
    }

    #[test]
    fn invalid_signature_never_reaches_the_store() {
        let (store, product) = FakeStore::with_product("500.00");
        let (svc, store, _) = service(store);
        let sig = SignatureVerifier::new(SECRET).sign("order_G1", "pay_OTHER");

        let err = svc
            .checkout_gateway(Uuid::new_v4(), gateway_checkout(product, 100_000, sig))
            .unwrap_err();

        assert!(matches!(err, CheckoutError::SignatureInvalid));
        assert_eq!(store.created_count(), 0);
    }

    #[test]
    fn verified_gateway_checkout_records_correlation_fields() {
        let (store, product) = FakeStore::with_product("500.00");
        let (svc, store, _) = service(store);
        let sig = SignatureVerifier::new(SECRET).sign("order_G1", "pay_G1");

        svc.checkout_gateway(Uuid::new_v4(), gateway_checkout(product, 100_000, sig.clone()))
            .unwrap();

        let created = store.created.lock().unwrap();
        let (_, _, payment) = &created[0];
        match payment {
            PaymentDetails::GatewayVerified {
                gateway_order_id,
                gateway_payment_id,
                gateway_signature,
            } => {
                assert_eq!(gateway_order_id, "order_G1");
                assert_eq!(gateway_payment_id, "pay_G1");
                assert_eq!(gateway_signature, &sig);
            }
            other => panic!("expected gateway payment, got {:?}", other),
        }
    }

    #[test]
    fn status_change_publishes_exactly_one_push() {
        let (svc, store, push) = service(FakeStore::default());
        let order_id = Uuid::new_v4();

        svc.set_order_status(order_id, OrderStatus::Shipped).unwrap();

        let published = push.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1["order_status"], "SHIPPED");
        assert_eq!(store.notifications.lock().unwrap().len(), 1);
    }

    #[test]
    fn unchanged_status_publishes_nothing() {
        let (svc, store, push) = service(FakeStore::default());

        svc.set_order_status(Uuid::new_v4(), OrderStatus::Processing)
            .unwrap();

        assert!(push.published.lock().unwrap().is_empty());
        assert!(store.notifications.lock().unwrap().is_empty());
    }

    #[test]
    fn update_address_requires_a_value() {
        let (svc, _, push) = service(FakeStore::default());

        let err = svc
            .update_address(Uuid::new_v4(), Uuid::new_v4(), "   ")
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InvalidPayload(_)));
        assert!(push.published.lock().unwrap().is_empty());
    }
}
