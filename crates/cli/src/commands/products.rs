//! Product list commands: one-shot listing and interactive search.

use soft_shop_core::{ProductName, paths};
use soft_shop_storefront::api::ShopClient;
use soft_shop_storefront::components::{AddOutcome, ListSettings, ProductList};
use soft_shop_storefront::error::Result;
use tokio::task::JoinSet;
use url::Url;

use super::{Context, print_cart, print_line, print_products, stdin_lines};

fn product_list(ctx: &Context) -> ProductList<ShopClient> {
    ProductList::new(
        ctx.client.clone(),
        ctx.cart_store(),
        ListSettings::from(&ctx.config),
    )
}

/// The products page URL, as the browser would have it.
fn page_url(ctx: &Context, filter: Option<&str>) -> Result<Url> {
    let mut url = ctx.client.endpoint(paths::PRODUCTS)?;
    if let Some(filter) = filter {
        url.query_pairs_mut().append_pair("filter", filter);
    }
    Ok(url)
}

fn show(list: &ProductList<ShopClient>) {
    print_products(&list.products(), list.total(), |p| list.can_add(p));
}

/// Print one page of products, `*` marking those already in the cart.
pub async fn list(ctx: &Context, filter: Option<String>) -> Result<()> {
    let list = product_list(ctx);
    list.mount(Some(&page_url(ctx, filter.as_deref())?)).await;
    show(&list);
    Ok(())
}

/// Interactive search.
///
/// Each input line replaces the filter; results print once typing settles.
/// `+name` adds a listed product to the cart, `-name` removes it.
pub async fn search(ctx: &Context) -> Result<()> {
    let list = product_list(ctx);
    list.mount(None).await;
    show(&list);
    print_line("Type to search, +name to add, -name to remove, Ctrl-D to quit");

    let mut lines = stdin_lines();
    let mut pending = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Some(name) = line.strip_prefix('+') {
                    add_listed(&list, name.trim());
                } else if let Some(name) = line.strip_prefix('-') {
                    let cart = list.remove_from_cart(&ProductName::from(name.trim()))?;
                    print_cart(&cart);
                } else {
                    let handle = list.set_filter(line);
                    pending.spawn(async move { handle.await });
                }
            }
            Some(joined) = pending.join_next() => {
                if let Ok(Err(error)) | Err(error) = joined {
                    tracing::warn!(%error, "Search task failed");
                }
                if pending.is_empty() {
                    show(&list);
                }
            }
        }
    }

    // Let the last search land before exiting
    if !pending.is_empty() {
        while pending.join_next().await.is_some() {}
        show(&list);
    }
    Ok(())
}

fn add_listed(list: &ProductList<ShopClient>, name: &str) {
    let Some(product) = list.products().into_iter().find(|p| p.name == name) else {
        print_line(&format!("{name} is not in the current results"));
        return;
    };
    match list.add_to_cart(&product) {
        AddOutcome::Added(cart) => print_cart(&cart),
        AddOutcome::AlreadyInCart => print_line(&format!("{name} is already in your cart")),
    }
}
