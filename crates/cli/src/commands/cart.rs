//! Cart commands.

use soft_shop_core::ProductName;
use soft_shop_storefront::api::ListQuery;
use soft_shop_storefront::components::{AddOutcome, ListSettings, ProductList};
use soft_shop_storefront::error::{Result, StorefrontError};

use super::{Context, print_cart, print_line};

pub fn show(ctx: &Context) {
    print_cart(&ctx.cart_store().load());
}

/// Add the product named exactly `name`, looked up in the catalog.
pub async fn add(ctx: &Context, name: &str) -> Result<()> {
    let page = ctx
        .client
        .list_products(&ListQuery::filter(name))
        .await?;
    let product = page
        .products
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| StorefrontError::NotFound(name.to_string()))?;

    let list = ProductList::new(
        ctx.client.clone(),
        ctx.cart_store(),
        ListSettings::from(&ctx.config),
    );
    match list.add_to_cart(&product) {
        AddOutcome::Added(cart) => print_cart(&cart),
        AddOutcome::AlreadyInCart => print_line(&format!("{name} is already in your cart")),
    }
    Ok(())
}

/// Remove every entry named `name`.
pub fn remove(ctx: &Context, name: &str) -> Result<()> {
    let list = ProductList::new(
        ctx.client.clone(),
        ctx.cart_store(),
        ListSettings::from(&ctx.config),
    );
    let cart = list.remove_from_cart(&ProductName::from(name))?;
    print_cart(&cart);
    Ok(())
}
