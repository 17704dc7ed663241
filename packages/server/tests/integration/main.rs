
mod add;
mod pin_rm;
