mod common;
mod routing;
mod store;
