//! services/storefront/src/app/checkout.rs
//!
//! The checkout payment selector: a small state machine over the ways a
//! shopper can pay for the current cart. Only the card path has an external
//! side effect (the hosted widget and the charge call).

use reqwest::Url;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::sync::Arc;
use storefront_core::ports::{CardCheckout, PaymentWidget, Route, WidgetOutcome};
use tracing::{error, info, warn};

use super::cart::{CartHolder, CartSnapshot};
use super::feedback;
use crate::api::StorefrontApi;
use crate::config::{BankAccount, PaymentProfile};

const CARD_DECLINED: &str = "Error processing the card";
const CHARGE_FAILED: &str = "Could not confirm the payment.";
const WIDGET_FAILED: &str = "Error starting the payment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferChannel {
    /// Mobile wallet transfer to the merchant phone.
    Wallet,
    Bank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Closed,
    Selecting,
    CardWidgetOpen,
    TransferInstructions(TransferChannel),
    MessagingHandoff { url: String },
}

impl CheckoutState {
    fn name(&self) -> &'static str {
        match self {
            CheckoutState::Closed => "closed",
            CheckoutState::Selecting => "selecting",
            CheckoutState::CardWidgetOpen => "card-widget-open",
            CheckoutState::TransferInstructions(_) => "transfer-instructions",
            CheckoutState::MessagingHandoff { .. } => "messaging-handoff",
        }
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("Cannot {action} while the payment selector is {state}")]
    InvalidTransition { state: String, action: &'static str },
    #[error("The cart is empty")]
    EmptyCart,
    #[error("The payment system is not available.")]
    CardUnavailable,
    #[error("The amount cannot be charged")]
    AmountOutOfRange,
    #[error("{message}")]
    Declined { message: String },
    #[error("{message}")]
    ChargeFailed { message: String },
}

/// What the transfer screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferInstructions {
    pub channel: TransferChannel,
    pub amount: Decimal,
    pub amount_label: String,
    pub wallet_phone: Option<String>,
    pub bank_accounts: Vec<BankAccount>,
}

/// `total` in minor currency units, rounding half away from zero.
pub fn minor_units(total: Decimal) -> Option<i64> {
    (total * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Two-decimal money text, rounding half away from zero.
fn money(symbol: &str, amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{} {:.2}", symbol, rounded)
}

fn handoff_message(snapshot: &CartSnapshot, symbol: &str) -> String {
    let lines: Vec<String> = snapshot
        .items
        .iter()
        .map(|item| {
            format!(
                "• {}\n  Quantity: {}\n  Subtotal: {}",
                item.product.name,
                item.quantity,
                money(symbol, item.subtotal())
            )
        })
        .collect();
    format!(
        "Hello, I would like to place an order with the following details:\n\n{}\n\nTotal to pay: {}",
        lines.join("\n\n"),
        money(symbol, snapshot.total())
    )
}

pub struct PaymentSelector {
    api: Arc<StorefrontApi>,
    cart: Arc<CartHolder>,
    widget: Arc<dyn PaymentWidget>,
    profile: PaymentProfile,
    state: CheckoutState,
}

impl PaymentSelector {
    pub fn new(
        api: Arc<StorefrontApi>,
        cart: Arc<CartHolder>,
        widget: Arc<dyn PaymentWidget>,
        profile: PaymentProfile,
    ) -> Self {
        Self {
            api,
            cart,
            widget,
            profile,
            state: CheckoutState::Closed,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    fn invalid(&self, action: &'static str) -> CheckoutError {
        CheckoutError::InvalidTransition {
            state: self.state.name().to_string(),
            action,
        }
    }

    fn require_selecting(&self, action: &'static str) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::Selecting => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    async fn non_empty_cart(&self) -> Result<CartSnapshot, CheckoutError> {
        let snapshot = self.cart.snapshot().await;
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        Ok(snapshot)
    }

    pub async fn open(&mut self) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::Closed {
            return Err(self.invalid("open"));
        }
        self.non_empty_cart().await?;
        self.state = CheckoutState::Selecting;
        Ok(())
    }

    pub fn close(&mut self) {
        self.state = CheckoutState::Closed;
    }

    /// Returns from a payment screen to the list of options.
    pub fn back(&mut self) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::CardWidgetOpen
            | CheckoutState::TransferInstructions(_)
            | CheckoutState::MessagingHandoff { .. } => {
                self.state = CheckoutState::Selecting;
                Ok(())
            }
            _ => Err(self.invalid("go back")),
        }
    }

    pub async fn show_transfer(
        &mut self,
        channel: TransferChannel,
    ) -> Result<TransferInstructions, CheckoutError> {
        self.require_selecting("show transfer instructions")?;
        let amount = self.non_empty_cart().await?.total();
        let (wallet_phone, bank_accounts) = match channel {
            TransferChannel::Wallet => (Some(self.profile.merchant_phone.clone()), Vec::new()),
            TransferChannel::Bank => (None, self.profile.bank_accounts.clone()),
        };
        self.state = CheckoutState::TransferInstructions(channel);
        Ok(TransferInstructions {
            channel,
            amount,
            amount_label: money(&self.profile.currency_symbol, amount),
            wallet_phone,
            bank_accounts,
        })
    }

    /// Builds the `wa.me` link listing every line and the total.
    pub async fn hand_off_to_messaging(&mut self) -> Result<String, CheckoutError> {
        self.require_selecting("hand off to messaging")?;
        let snapshot = self.non_empty_cart().await?;
        let message = handoff_message(&snapshot, &self.profile.currency_symbol);
        let base = format!("https://wa.me/{}", self.profile.merchant_phone);
        let url = Url::parse_with_params(&base, &[("text", message)])
            .map_err(|_| self.invalid("hand off to messaging"))?
            .to_string();
        self.state = CheckoutState::MessagingHandoff { url: url.clone() };
        Ok(url)
    }

    /// Opens the card widget and charges the token it yields. Any failure
    /// leaves the widget state in place for a manual retry.
    pub async fn pay_by_card(&mut self) -> Result<(), CheckoutError> {
        if !matches!(
            self.state,
            CheckoutState::Selecting | CheckoutState::CardWidgetOpen
        ) {
            return Err(self.invalid("pay by card"));
        }
        let public_key = self
            .profile
            .culqi_public_key
            .clone()
            .ok_or(CheckoutError::CardUnavailable)?;
        let snapshot = self.non_empty_cart().await?;
        let amount_minor = minor_units(snapshot.total()).ok_or(CheckoutError::AmountOutOfRange)?;

        let checkout = CardCheckout {
            public_key,
            title: self.profile.store_title.clone(),
            currency: self.profile.currency.clone(),
            amount_minor,
        };
        self.state = CheckoutState::CardWidgetOpen;

        let outcome = self.widget.collect_token(&checkout).await.map_err(|e| {
            error!("Card widget failed: {}", e);
            CheckoutError::ChargeFailed {
                message: WIDGET_FAILED.to_string(),
            }
        })?;
        let token = match outcome {
            WidgetOutcome::Token(token) => token,
            WidgetOutcome::Declined { user_message } => {
                warn!("Card declined by the widget");
                return Err(CheckoutError::Declined {
                    message: user_message.unwrap_or_else(|| CARD_DECLINED.to_string()),
                });
            }
        };

        self.api.charge_card(&token).await.map_err(|e| {
            error!("Charge failed: {}", e);
            CheckoutError::ChargeFailed {
                message: feedback::describe(&e, CHARGE_FAILED),
            }
        })?;

        info!(amount_minor, currency = %checkout.currency, "Card payment confirmed");
        self.state = CheckoutState::Closed;
        self.api.client().navigator().navigate(Route::Orders);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cart_item_json, cart_json, Harness};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use storefront_core::ports::{Method, PortResult};

    struct FakeWidget {
        outcome: WidgetOutcome,
        opened: Mutex<Vec<CardCheckout>>,
    }

    impl FakeWidget {
        fn new(outcome: WidgetOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                opened: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PaymentWidget for FakeWidget {
        async fn collect_token(&self, checkout: &CardCheckout) -> PortResult<WidgetOutcome> {
            self.opened.lock().unwrap().push(checkout.clone());
            Ok(self.outcome.clone())
        }
    }

    fn profile() -> PaymentProfile {
        PaymentProfile {
            culqi_public_key: Some("pk_test_123".into()),
            bank_accounts: vec![BankAccount {
                bank: "BCP".into(),
                account: "123-4567890-0-12".into(),
                cci: "00212345678900123".into(),
                holder: "Promelab SAC".into(),
            }],
            ..PaymentProfile::default()
        }
    }

    async fn selector(h: &Harness, widget: Arc<FakeWidget>) -> PaymentSelector {
        h.transport.on(
            Method::Get,
            "/cart/",
            200,
            cart_json(vec![
                cart_item_json(1, "Beaker", 2, "10.00", 8),
                cart_item_json(2, "Pipette", 1, "5.505", 3),
            ]),
        );
        let cart = Arc::new(CartHolder::new(h.api.clone()));
        cart.load().await;
        PaymentSelector::new(h.api.clone(), cart, widget, profile())
    }

    #[test]
    fn minor_units_round_half_away_from_zero() {
        assert_eq!(minor_units(Decimal::new(2550, 2)), Some(2550));
        assert_eq!(minor_units(Decimal::new(10005, 3)), Some(1001));
        assert_eq!(minor_units(Decimal::new(10004, 3)), Some(1000));
    }

    #[tokio::test]
    async fn opening_requires_items() {
        let h = Harness::signed_in();
        h.transport.on(Method::Get, "/cart/", 200, cart_json(vec![]));
        let cart = Arc::new(CartHolder::new(h.api.clone()));
        cart.load().await;
        let widget = FakeWidget::new(WidgetOutcome::Token("tkn".into()));
        let mut selector = PaymentSelector::new(h.api.clone(), cart, widget, profile());

        assert_eq!(selector.open().await, Err(CheckoutError::EmptyCart));
        assert_eq!(selector.state(), &CheckoutState::Closed);
    }

    #[tokio::test]
    async fn card_token_is_charged_then_orders_open() {
        let h = Harness::signed_in();
        h.transport
            .on(Method::Post, "/payments/culqi/charge/", 200, json!({ "status": "PAID" }));
        let widget = FakeWidget::new(WidgetOutcome::Token("tkn_live_1".into()));
        let mut selector = selector(&h, widget.clone()).await;

        selector.open().await.unwrap();
        selector.pay_by_card().await.unwrap();

        let opened = widget.opened.lock().unwrap().clone();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].amount_minor, 2551);
        assert_eq!(opened[0].currency, "PEN");
        assert_eq!(opened[0].title, "PROMELAB");
        let charge = h
            .transport
            .requests()
            .into_iter()
            .find(|r| r.path == "/payments/culqi/charge/")
            .unwrap();
        assert_eq!(charge.body, Some(json!({ "token": "tkn_live_1" })));
        assert_eq!(selector.state(), &CheckoutState::Closed);
        assert_eq!(h.navigator.current(), Some(Route::Orders));
    }

    #[tokio::test]
    async fn failed_charge_keeps_the_widget_for_retry() {
        let h = Harness::signed_in();
        h.transport.on(
            Method::Post,
            "/payments/culqi/charge/",
            402,
            json!({ "detail": "Card has insufficient funds" }),
        );
        let widget = FakeWidget::new(WidgetOutcome::Token("tkn".into()));
        let mut selector = selector(&h, widget).await;
        selector.open().await.unwrap();

        let error = selector.pay_by_card().await.unwrap_err();

        assert_eq!(error.to_string(), "Card has insufficient funds");
        assert_eq!(selector.state(), &CheckoutState::CardWidgetOpen);
        assert!(h.navigator.history().is_empty());
        // The shopper can click again from the open widget.
        assert!(selector.pay_by_card().await.is_err());
        assert_eq!(h.transport.count(Method::Post, "/payments/culqi/charge/"), 2);
    }

    #[tokio::test]
    async fn declined_widget_uses_the_default_message() {
        let h = Harness::signed_in();
        let widget = FakeWidget::new(WidgetOutcome::Declined { user_message: None });
        let mut selector = selector(&h, widget).await;
        selector.open().await.unwrap();

        let error = selector.pay_by_card().await.unwrap_err();

        assert_eq!(error.to_string(), CARD_DECLINED);
        assert_eq!(h.transport.count(Method::Post, "/payments/culqi/charge/"), 0);
    }

    #[tokio::test]
    async fn card_needs_a_public_key() {
        let h = Harness::signed_in();
        let widget = FakeWidget::new(WidgetOutcome::Token("tkn".into()));
        let mut selector = selector(&h, widget.clone()).await;
        selector.profile.culqi_public_key = None;
        selector.open().await.unwrap();

        assert_eq!(selector.pay_by_card().await, Err(CheckoutError::CardUnavailable));
        assert!(widget.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transfer_instructions_show_amount_and_accounts() {
        let h = Harness::signed_in();
        let widget = FakeWidget::new(WidgetOutcome::Token("tkn".into()));
        let mut selector = selector(&h, widget).await;
        selector.open().await.unwrap();

        let bank = selector.show_transfer(TransferChannel::Bank).await.unwrap();
        assert_eq!(bank.bank_accounts.len(), 1);
        assert_eq!(bank.amount_label, "S/ 25.51");
        assert_eq!(
            selector.state(),
            &CheckoutState::TransferInstructions(TransferChannel::Bank)
        );

        selector.back().unwrap();
        let wallet = selector.show_transfer(TransferChannel::Wallet).await.unwrap();
        assert_eq!(wallet.wallet_phone.as_deref(), Some("51962162027"));
    }

    #[tokio::test]
    async fn messaging_link_lists_every_line() {
        let h = Harness::signed_in();
        let widget = FakeWidget::new(WidgetOutcome::Token("tkn".into()));
        let mut selector = selector(&h, widget).await;
        selector.open().await.unwrap();

        let link = selector.hand_off_to_messaging().await.unwrap();

        let url = Url::parse(&link).unwrap();
        assert_eq!(url.host_str(), Some("wa.me"));
        assert_eq!(url.path(), "/51962162027");
        let (_, text) = url.query_pairs().find(|(k, _)| k == "text").unwrap();
        assert!(text.contains("• Beaker\n  Quantity: 2\n  Subtotal: S/ 20.00"));
        assert!(text.contains("• Pipette"));
        assert!(text.ends_with("Total to pay: S/ 25.51"));
        assert!(matches!(selector.state(), CheckoutState::MessagingHandoff { .. }));
    }

    #[tokio::test]
    async fn actions_outside_their_state_are_rejected() {
        let h = Harness::signed_in();
        let widget = FakeWidget::new(WidgetOutcome::Token("tkn".into()));
        let mut selector = selector(&h, widget).await;

        let error = selector.pay_by_card().await.unwrap_err();
        assert_eq!(
            error,
            CheckoutError::InvalidTransition {
                state: "closed".into(),
                action: "pay by card"
            }
        );
        assert!(selector.back().is_err());
    }
}
