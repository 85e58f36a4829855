pub mod evidence;
pub mod health;
