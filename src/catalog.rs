//! Named queries.
//!
//! A [`Catalog`] holds the queries declared under `[queries.*]` in the
//! configuration. Their argument and column types are written as strings,
//! so they are resolved when a query is run; an unknown type name fails the
//! call like any other error, through the caller's error factory.

use crate::config::{Config, NamedQuery};
use crate::core::db::{ColumnType, Connection, Query, QueryExecutor, Row, SqlType, Value};
use crate::core::{translate, AccessError, ErrorFactory};
use std::collections::BTreeMap;

/// Queries addressable by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    queries: BTreeMap<String, NamedQuery>,
    log_arguments: bool,
}

impl Catalog {
    pub fn from_config(config: &Config) -> Self {
        Catalog {
            queries: config.queries.clone(),
            log_arguments: config.log_arguments(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, query: NamedQuery) {
        self.queries.insert(name.into(), query);
    }

    pub fn get(&self, name: &str) -> Option<&NamedQuery> {
        self.queries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    /// Runs the named read with `arguments`.
    pub fn execute_query<C, F>(
        &self,
        connection: &C,
        name: &str,
        arguments: Vec<Value>,
        factory: &F,
    ) -> Result<Vec<Row>, AccessError<F::Error>>
    where
        C: Connection,
        F: ErrorFactory,
    {
        let named = self.lookup(name, factory)?;
        let columns = resolve_columns(&named.columns).map_err(|tag| {
            translate(factory, format!("Unsupported column type is used: {tag}"))
        })?;
        let query = build_query(named, arguments, factory)?;
        self.executor(connection).query(&query, &columns, factory)
    }

    /// Runs the named mutation with `arguments`.
    pub fn execute_update<C, F>(
        &self,
        connection: &C,
        name: &str,
        arguments: Vec<Value>,
        factory: &F,
    ) -> Result<u64, AccessError<F::Error>>
    where
        C: Connection,
        F: ErrorFactory,
    {
        let named = self.lookup(name, factory)?;
        let query = build_query(named, arguments, factory)?;
        self.executor(connection).update(&query, factory)
    }

    fn lookup<F: ErrorFactory>(
        &self,
        name: &str,
        factory: &F,
    ) -> Result<&NamedQuery, AccessError<F::Error>> {
        self.queries
            .get(name)
            .ok_or_else(|| translate(factory, format!("No query named [{name}] is defined.")))
    }

    fn executor<'c, C: Connection>(&self, connection: &'c C) -> QueryExecutor<'c, C> {
        QueryExecutor::new(connection).log_arguments(self.log_arguments)
    }
}

fn resolve_columns(tags: &[String]) -> Result<Vec<ColumnType>, String> {
    tags.iter().map(|tag| tag.parse()).collect()
}

fn build_query<F: ErrorFactory>(
    named: &NamedQuery,
    arguments: Vec<Value>,
    factory: &F,
) -> Result<Query, AccessError<F::Error>> {
    let types = named
        .arguments
        .iter()
        .map(|tag| tag.parse::<SqlType>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|tag| translate(factory, format!("Unsupported argument type is used: {tag}")))?;
    Query::with_arguments(named.sql.clone(), arguments, types)
        .map_err(|e| translate(factory, e.to_string()))
}
