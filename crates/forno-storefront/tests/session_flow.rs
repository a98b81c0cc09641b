//! Session flow: menu → cart → checkout → handoff, with in-memory
//! collaborators.

use std::time::Duration;

use forno_core::checkout::AddressForm;
use forno_core::types::{
    Customer, DeliveryType, FlavorMode, PaymentMethod, ResolvedAddress, Size,
};
use forno_core::{CheckoutFailure, CheckoutForm, Money};
use forno_storefront::catalog::fallback_catalog;
use forno_storefront::{
    AddressLookup, HandoffOutcome, RecordingTransport, Session, SessionState, StaticAddressBook,
    StorefrontConfig, StorefrontError, StorefrontResult,
};

fn session() -> Session {
    Session::new(fallback_catalog(), &StorefrontConfig::default()).unwrap()
}

fn sao_paulo() -> ResolvedAddress {
    ResolvedAddress {
        postal_code: "01310100".to_string(),
        street: "Avenida Paulista".to_string(),
        neighborhood: "Bela Vista".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
    }
}

fn address_book() -> StaticAddressBook {
    StaticAddressBook::new().with_address(sao_paulo())
}

fn delivery_form(postal_code: &str) -> CheckoutForm {
    CheckoutForm {
        delivery_type: DeliveryType::Delivery,
        customer: Customer {
            name: "João Silva".to_string(),
            phone: "(11) 98765-4321".to_string(),
        },
        address: Some(AddressForm {
            postal_code: postal_code.to_string(),
            number: "1000".to_string(),
            complement: Some("Apto 12".to_string()),
        }),
        payment_method: Some(PaymentMethod::Card),
        notes: Some("Sem cebola".to_string()),
    }
}

/// Lookup that never answers in time.
struct SlowLookup;

impl AddressLookup for SlowLookup {
    async fn lookup(&self, _postal_code: &str) -> StorefrontResult<Option<ResolvedAddress>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(None)
    }
}

/// Lookup whose backing service is down.
struct BrokenLookup;

impl AddressLookup for BrokenLookup {
    async fn lookup(&self, _postal_code: &str) -> StorefrontResult<Option<ResolvedAddress>> {
        Err(StorefrontError::LookupFailed("connection refused".to_string()))
    }
}

#[tokio::test]
async fn delivery_order_is_handed_off_and_cart_cleared() {
    let mut s = session();

    // Half Margherita (35.00), half Portuguesa (45.00)
    s.set_mode(FlavorMode::Double);
    s.toggle_flavor("1");
    assert!(s.toggle_flavor("3").is_some());
    s.toggle_product("6");

    assert_eq!(s.totals().subtotal, Money::from_cents(5300));

    let handoff = s.checkout(&delivery_form("01310-100"), &address_book()).await.unwrap();
    assert!(handoff.url.starts_with("https://wa.me/5511999887766?text="));
    assert!(handoff.text.contains("1/2 Margherita"));
    assert!(handoff.text.contains("Avenida Paulista"));
    assert!(handoff.text.ends_with("*Total: R$ 58,00*"));

    let pending = s.pending().unwrap();
    assert_eq!(pending.order.total, Money::from_cents(5800));

    let transport = RecordingTransport::new();
    let outcome = s.hand_off(&transport).unwrap();

    assert!(outcome.is_opened());
    assert_eq!(transport.opened(), vec![handoff.url.clone()]);
    assert!(s.cart().is_empty());
    assert!(s.pending().is_none());
}

#[tokio::test]
async fn failed_transport_keeps_order_for_manual_copy() {
    let mut s = session();
    s.add_product("2", Size::Regular).unwrap();

    let handoff = s.checkout(&delivery_form("01310100"), &address_book()).await.unwrap();

    let outcome = s.hand_off(&RecordingTransport::failing("no handler for wa.me")).unwrap();
    match outcome {
        HandoffOutcome::ManualFallback { url, text, reason } => {
            assert_eq!(url, handoff.url);
            assert_eq!(text, handoff.text);
            assert!(reason.contains("no handler"));
        }
        other => panic!("expected manual fallback, got {:?}", other),
    }

    assert_eq!(s.cart().line_count(), 1);
    assert!(s.pending().is_some());
}

#[tokio::test]
async fn unknown_postal_code_rejects_checkout() {
    let mut s = session();
    s.add_product("3", Size::Regular).unwrap();

    let err = s.checkout(&delivery_form("99999-999"), &address_book()).await.unwrap_err();
    match err {
        StorefrontError::Checkout(rejected) => {
            assert_eq!(
                rejected.failures,
                vec![CheckoutFailure::UnknownPostalCode("99999999".to_string())]
            );
        }
        other => panic!("expected checkout rejection, got {:?}", other),
    }
    assert!(s.pending().is_none());
}

#[tokio::test]
async fn pickup_skips_address_lookup() {
    let mut s = session();
    s.add_product("1", Size::Regular).unwrap();

    let form = CheckoutForm {
        delivery_type: DeliveryType::Pickup,
        address: None,
        ..delivery_form("")
    };

    // The broken service is never consulted for pickup orders
    let handoff = s.checkout(&form, &BrokenLookup).await.unwrap();
    assert!(handoff.text.ends_with("*Total: R$ 35,00*"));
}

#[tokio::test]
async fn lookup_failure_is_reported() {
    let mut s = session();
    s.add_product("1", Size::Regular).unwrap();

    let err = s.checkout(&delivery_form("01310100"), &BrokenLookup).await.unwrap_err();
    assert!(matches!(err, StorefrontError::LookupFailed(_)));
}

#[tokio::test(start_paused = true)]
async fn slow_lookup_times_out() {
    let mut s = session();
    s.add_product("1", Size::Regular).unwrap();

    let err = s.checkout(&delivery_form("01310100"), &SlowLookup).await.unwrap_err();
    assert!(matches!(err, StorefrontError::LookupTimeout(5)));
}

#[tokio::test]
async fn cart_edit_discards_pending_order() {
    let mut s = session();
    let handle = s.add_product("2", Size::Regular).unwrap();
    s.checkout(&delivery_form("01310100"), &address_book()).await.unwrap();
    assert!(s.pending().is_some());

    s.set_quantity(handle, 2);
    assert!(s.pending().is_none());
    assert!(matches!(
        s.hand_off(&RecordingTransport::new()),
        Err(StorefrontError::NothingToHandOff)
    ));
}

#[tokio::test]
async fn shared_state_checkout() {
    let state = SessionState::new(session());
    state.with_session_mut(|s| s.add_product("4", Size::Small)).unwrap();

    let totals = state.with_session(|s| s.totals());
    assert_eq!(totals.subtotal, Money::from_cents(2800));

    let handoff = state
        .checkout(&delivery_form("01310100"), &address_book())
        .await
        .unwrap();
    assert!(handoff.text.contains("Chocolate (Small)"));

    let clone = state.clone();
    let outcome = clone.with_session_mut(|s| s.hand_off(&RecordingTransport::new())).unwrap();
    assert!(outcome.is_opened());
    assert!(state.with_session(|s| s.cart().is_empty()));
}
