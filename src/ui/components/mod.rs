pub mod language_modal;
pub mod menu;
pub mod response_panel;
