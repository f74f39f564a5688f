pub mod perception;
pub mod brain;
pub mod action;
