//! Server routes known to the client.

/// Catalog list endpoint (`GET`, `filter`/`limit`/`offset` query parameters).
pub const API_LIST: &str = "/api/list";

/// Order submission endpoint (`POST`, JSON body).
pub const API_ORDER: &str = "/api/order";

/// Product list page.
pub const PRODUCTS: &str = "/products";

/// Checkout page. The server injects the CSRF token into it.
pub const CHECKOUT: &str = "/checkout";

/// Navigation target after a successful order.
pub const THANK_YOU: &str = "/thank-you";

/// Login page and form endpoint.
pub const LOGIN: &str = "/login";

/// Session teardown.
pub const LOGOUT: &str = "/logout";
