mod helpers;
mod user_test;
mod verification_test;
