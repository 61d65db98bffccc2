pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;
