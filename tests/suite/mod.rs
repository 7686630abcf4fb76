mod combinators;
mod config;
mod delay;
mod promise;
