// src/lib.rs
//
// Núcleo contábil (ledger) de uma gráfica: clientes, produtos, vendas e
// pagamentos, com o motor de alocação que decide como o dinheiro flui entre
// dívida, crédito pré-pago e as vendas em aberto de cada cliente.
//
// Este crate é uma biblioteca: a camada HTTP (roteamento, autenticação,
// paginação) vive fora dele e nos entrega entradas já desserializadas.

pub mod common;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

pub use config::AppState;
