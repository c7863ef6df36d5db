pub mod activities;
pub mod activity;
pub mod award;
pub mod status;
