mod helpers;
mod orders;
mod products;
mod tokens;
