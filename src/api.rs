pub mod bad_route;
pub mod greeter;
pub mod use_case;
