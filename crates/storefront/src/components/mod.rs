//! The storefront's two UI components, without the UI.
//!
//! - [`ProductList`] - searchable catalog with add/remove to cart
//! - [`Checkout`] - address form, confirmation, order submission
//!
//! The components never talk to each other. The cart in storage is the only
//! thing they share, and each re-reads it whenever it acts on it.

pub mod checkout;
pub mod product_list;

pub use checkout::{Checkout, CheckoutError, CheckoutPhase, Confirmation, SubmitOutcome};
pub use product_list::{AddOutcome, ListError, ListSettings, ProductList};
