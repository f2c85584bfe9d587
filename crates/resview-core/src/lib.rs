pub mod category;
pub mod consts;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod formatting;
pub mod idlist;
pub mod item;
pub mod loader;
pub mod store;
pub mod view;
pub mod view_state;
