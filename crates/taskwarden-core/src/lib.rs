//! taskwarden-core
//!
//! Core building blocks for the taskwarden task-tracking service.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, user, task, revision, query, errors）
//! - **ports**: 抽象化レイヤー（UserDirectory, TaskStore, Clock, IdGenerator）
//! - **service**: コアロジック（authorize, validate, TaskService, UserService）
//! - **impls**: 実装（InMemoryTaskStore など開発・テスト用）
//! - **app**: アプリケーションの構築とワイヤリング（AppBuilder）
//!
//! 変更系の呼び出しは必ず validate → authorize → persist → revision の順に進み、
//! すべての変更はリビジョンログ（追記専用）に 1 行残る。

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod service;
