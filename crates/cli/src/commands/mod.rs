//! Command implementations.
//!
//! Results go to stdout; logs go to stderr through tracing.

pub mod cart;
pub mod checkout;
pub mod products;
pub mod session;

use soft_shop_core::{Cart, Product};
use soft_shop_storefront::api::ShopClient;
use soft_shop_storefront::cart::CartStore;
use soft_shop_storefront::config::ShopConfig;
use soft_shop_storefront::storage::StorageAdapter;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Everything a command needs, built once in `main`.
pub struct Context {
    pub config: ShopConfig,
    pub storage: StorageAdapter,
    pub client: ShopClient,
}

impl Context {
    pub fn cart_store(&self) -> CartStore {
        CartStore::new(self.storage.clone())
    }
}

/// Line reader over stdin.
pub fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Print `message` and read one line of input, trimmed.
///
/// Returns `None` at end of input.
pub async fn prompt(
    lines: &mut Lines<BufReader<Stdin>>,
    message: &str,
) -> std::io::Result<Option<String>> {
    print_line(message);
    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

#[allow(clippy::print_stdout)]
pub fn print_line(line: &str) {
    println!("{line}");
}

#[allow(clippy::print_stdout)]
pub fn print_products(products: &[Product], total: u64, can_add: impl Fn(&Product) -> bool) {
    for product in products {
        let marker = if can_add(product) { " " } else { "*" };
        println!(
            "{marker} {:<20} {:<32} {:>10}",
            product.name, product.title, product.price
        );
    }
    println!("Showing {} of {total} products", products.len());
}

#[allow(clippy::print_stdout)]
pub fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for item in cart {
        println!("  {:<20} {:<32} {:>10}", item.name, item.title, item.price);
    }
    println!("{} item(s), subtotal {}", cart.len(), cart.subtotal());
}
