pub mod fake_provider;
pub mod mongo;
pub mod seed;
pub mod test_app;
