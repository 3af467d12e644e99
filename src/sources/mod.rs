pub mod oauth2;
