//! Reusable view building blocks.
//!
//! SYSTEM CONTEXT
//! ==============
//! `view` defines the typed render tree and its two renderers; `widgets`
//! builds the shared storefront pieces (navbar, product cards, order tables,
//! forms) that several pages compose.

pub mod view;
pub mod widgets;
