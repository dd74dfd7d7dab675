pub mod ast;
pub mod backend;
pub mod config;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod token;
pub mod transpiler;
