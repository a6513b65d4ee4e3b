//! Checkout: fill the address, confirm, submit.

use secrecy::SecretString;
use soft_shop_core::AddressForm;
use soft_shop_storefront::api::ShopClient;
use soft_shop_storefront::components::{Checkout, SubmitOutcome};
use soft_shop_storefront::error::{Result, StorefrontError};

use super::{Context, print_cart, print_line, prompt, stdin_lines};
use crate::CheckoutArgs;

/// Run the checkout flow once.
///
/// Without `--yes` the confirmation is asked on stdin; anything but `yes`/`y`
/// cancels. A rejected order shows the error, dismisses it, and exits
/// non-zero with the cart untouched.
pub async fn run(ctx: &Context, args: CheckoutArgs) -> Result<()> {
    let csrf: SecretString = match &ctx.config.csrf_token {
        Some(token) => token.clone(),
        None => ctx.client.checkout_csrf_token().await?,
    };

    let mut checkout = Checkout::mount(ctx.client.clone(), ctx.cart_store(), csrf);
    if checkout.items().is_empty() {
        print_line("Your cart is empty; the order will contain no products");
    }

    *checkout.address_mut() = AddressForm {
        city: args.city,
        area: args.area,
        code: args.code,
        street: args.street,
        street_number: args.street_number,
    };
    checkout.submit_form()?;

    if let Some(confirmation) = checkout.confirmation() {
        let address = &confirmation.address;
        print_line(&format!(
            "Deliver to {} {}, {}, {} {}",
            address.street, address.street_number, address.area, address.city, address.code
        ));
        print_cart(checkout.items());
    }

    if !args.yes && !ask_yes().await? {
        checkout.cancel()?;
        print_line("Order cancelled");
        return Ok(());
    }

    finish(&mut checkout).await
}

async fn ask_yes() -> Result<bool> {
    let mut lines = stdin_lines();
    let answer = prompt(&mut lines, "Place this order? [yes/no]").await?;
    Ok(answer.is_some_and(|a| matches!(a.to_ascii_lowercase().as_str(), "yes" | "y")))
}

async fn finish(checkout: &mut Checkout<ShopClient>) -> Result<()> {
    match checkout.confirm().await? {
        SubmitOutcome::Ordered { redirect_to } => {
            tracing::debug!(redirect_to, "Navigating after order");
            print_line("Thank you! Your order has been placed.");
            Ok(())
        }
        SubmitOutcome::Failed { reason } => {
            print_line(&format!("Something went wrong: {reason}"));
            checkout.dismiss_error()?;
            Err(StorefrontError::OrderFailed(reason))
        }
    }
}
