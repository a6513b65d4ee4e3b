//! Checkout: address form, confirmation, order submission.
//!
//! # States
//!
//! ```text
//! Idle --submit_form--> ConfirmPending --cancel--> Idle
//!                            |
//!                         confirm
//!                            v
//!                        Submitting --accepted--> Idle (cart cleared, navigate to /thank-you)
//!                            |
//!                         rejected
//!                            v
//!                        ErrorShown --dismiss_error--> Idle
//! ```
//!
//! A failed submission leaves the stored cart and the address form exactly
//! as they were, so the user can dismiss the error and confirm again.

use core::fmt;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use soft_shop_core::{AddressError, AddressForm, Cart, CartItem, Order, paths};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::OrderSink;
use crate::cart::CartStore;
use crate::error::add_breadcrumb;

/// Where the checkout is in its confirmation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    /// The confirmation modal is open.
    ConfirmPending,
    /// The order request is in flight.
    Submitting,
    /// The error modal is open.
    ErrorShown,
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ConfirmPending => "awaiting confirmation",
            Self::Submitting => "submitting",
            Self::ErrorShown => "showing an error",
        };
        f.write_str(name)
    }
}

/// Errors from checkout actions. None of them changes component state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// The action is not available in the current phase.
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        phase: CheckoutPhase,
        action: &'static str,
    },

    /// The address form is incomplete.
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),
}

/// How a confirmed submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server accepted the order; the cart was cleared.
    Ordered {
        /// Where the page navigates next.
        redirect_to: &'static str,
    },
    /// The order was rejected or never arrived; the error modal is open.
    Failed {
        /// What went wrong, for logs and display.
        reason: String,
    },
}

/// What the confirmation modal shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub address: AddressForm,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
}

/// The checkout component.
pub struct Checkout<O> {
    orders: O,
    cart: CartStore,
    csrf: SecretString,
    phase: CheckoutPhase,
    address: AddressForm,
    items: Cart,
    navigated_to: Option<&'static str>,
    last_error: Option<String>,
}

impl<O: OrderSink> Checkout<O> {
    /// Mount the checkout: read the stored cart (absent means empty) and take
    /// the page's CSRF token. The address form starts blank.
    #[must_use]
    pub fn mount(orders: O, cart: CartStore, csrf: SecretString) -> Self {
        let items = cart.load();
        Self {
            orders,
            cart,
            csrf,
            phase: CheckoutPhase::Idle,
            address: AddressForm::default(),
            items,
            navigated_to: None,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    #[must_use]
    pub const fn show_submit_modal(&self) -> bool {
        matches!(self.phase, CheckoutPhase::ConfirmPending)
    }

    #[must_use]
    pub const fn show_error_modal(&self) -> bool {
        matches!(self.phase, CheckoutPhase::ErrorShown)
    }

    /// Cart as read on mount or at the last confirmation.
    #[must_use]
    pub const fn items(&self) -> &Cart {
        &self.items
    }

    #[must_use]
    pub const fn address(&self) -> &AddressForm {
        &self.address
    }

    /// The form, for editing.
    pub const fn address_mut(&mut self) -> &mut AddressForm {
        &mut self.address
    }

    /// The page the component navigated to after a successful order.
    #[must_use]
    pub const fn navigated_to(&self) -> Option<&'static str> {
        self.navigated_to
    }

    /// Why the last submission failed, while the error modal is open.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Contents of the confirmation modal, while it is open.
    #[must_use]
    pub fn confirmation(&self) -> Option<Confirmation> {
        self.show_submit_modal().then(|| Confirmation {
            address: self.address.clone(),
            items: self.items.items().to_vec(),
            subtotal: self.items.subtotal(),
        })
    }

    fn expect_phase(&self, expected: CheckoutPhase, action: &'static str) -> Result<(), CheckoutError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    /// Submit the address form: open the confirmation modal. Nothing is sent.
    ///
    /// # Errors
    ///
    /// Fails outside `Idle`, or if a required address field is blank.
    pub fn submit_form(&mut self) -> Result<(), CheckoutError> {
        self.expect_phase(CheckoutPhase::Idle, "submit the form")?;
        self.address.validate()?;
        self.phase = CheckoutPhase::ConfirmPending;
        Ok(())
    }

    /// Answer "No" to the confirmation: close it without sending anything.
    ///
    /// # Errors
    ///
    /// Fails unless the confirmation modal is open.
    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        self.expect_phase(CheckoutPhase::ConfirmPending, "cancel")?;
        self.phase = CheckoutPhase::Idle;
        Ok(())
    }

    /// Answer "Yes" to the confirmation: submit the order built from the cart
    /// as stored right now, the address form and the CSRF token.
    ///
    /// On success the stored cart is removed and the component navigates to
    /// `/thank-you`. On failure the error modal opens and nothing else changes.
    /// If the returned future is dropped before the server answers, the
    /// confirmation modal is open again.
    ///
    /// # Errors
    ///
    /// Fails unless the confirmation modal is open. A rejected order is not an
    /// error; see [`SubmitOutcome::Failed`].
    #[instrument(skip(self))]
    pub async fn confirm(&mut self) -> Result<SubmitOutcome, CheckoutError> {
        self.expect_phase(CheckoutPhase::ConfirmPending, "confirm")?;
        let submitting = PhaseGuard::enter(
            &mut self.phase,
            CheckoutPhase::Submitting,
            CheckoutPhase::ConfirmPending,
        );

        self.items = self.cart.load();
        let order = Order::new(
            self.items.clone(),
            self.address.clone(),
            self.csrf.expose_secret(),
        );
        add_breadcrumb("checkout", "Order confirmed", None);

        match self.orders.submit_order(&order).await {
            Ok(()) => {
                self.cart.clear();
                submitting.leave(CheckoutPhase::Idle);
                self.navigated_to = Some(paths::THANK_YOU);
                self.last_error = None;
                info!(items = order.products.len(), "Order placed");
                Ok(SubmitOutcome::Ordered {
                    redirect_to: paths::THANK_YOU,
                })
            }
            Err(error) => {
                warn!(%error, "Order submission failed");
                let reason = error.to_string();
                submitting.leave(CheckoutPhase::ErrorShown);
                self.last_error = Some(reason.clone());
                Ok(SubmitOutcome::Failed { reason })
            }
        }
    }

    /// Close the error modal.
    ///
    /// # Errors
    ///
    /// Fails unless the error modal is open.
    pub fn dismiss_error(&mut self) -> Result<(), CheckoutError> {
        self.expect_phase(CheckoutPhase::ErrorShown, "dismiss the error")?;
        self.phase = CheckoutPhase::Idle;
        self.last_error = None;
        Ok(())
    }
}

/// Holds the phase while an action is in flight and sets the phase it ends
/// in when dropped, so a cancelled action cannot leave it stuck.
struct PhaseGuard<'a> {
    phase: &'a mut CheckoutPhase,
    exit: CheckoutPhase,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a mut CheckoutPhase, during: CheckoutPhase, on_cancel: CheckoutPhase) -> Self {
        *phase = during;
        Self {
            phase,
            exit: on_cancel,
        }
    }

    fn leave(mut self, next: CheckoutPhase) {
        self.exit = next;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *self.phase = self.exit;
    }
}

impl<O> fmt::Debug for Checkout<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkout")
            .field("phase", &self.phase)
            .field("address", &self.address)
            .field("items", &self.items.len())
            .field("csrf", &"[REDACTED]")
            .field("navigated_to", &self.navigated_to)
            .finish_non_exhaustive()
    }
}
