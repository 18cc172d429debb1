//! Command execution glue: run a command through an executor and map its rows

use std::{future::Future, sync::Arc};

use futures::Stream;

use crate::{
    config::Config,
    error::Result,
    mapping::{MapRows, MapStream, Mapped, Mapper, Registry},
    sql::{
        params::{Arg, Command, Parameters},
        types::Row,
    },
};

pub use replay::{Recording, ReplayExecutor, ReplayRows, ResultSet};

mod replay;

/// Runs commands against a data source and yields raw rows
///
/// Rows are forward-only; an executor hands them out as they are read.
pub trait Executor {
    type Rows: Iterator<Item = Result<Row>>;

    fn query(&mut self, command: &Command) -> Result<Self::Rows>;

    /// Runs a command that returns no rows, giving the affected row count
    fn execute(&mut self, command: &Command) -> Result<u64>;

    fn session(self, config: Config) -> Session<Self>
    where
        Self: Sized,
    {
        Session::new(self, config)
    }
}

/// Executor whose rows arrive asynchronously
pub trait AsyncExecutor {
    type Stream: Stream<Item = Result<Row>> + Unpin;

    fn query_async(&mut self, command: &Command) -> impl Future<Output = Result<Self::Stream>>;
}

/// Query session: builds commands, executes them and maps the rows
pub struct Session<E> {
    executor: E,
    config: Config,
    mapper: Mapper,
}

impl<E> Session<E> {
    /// Session over the process-wide registry
    pub fn new(executor: E, config: Config) -> Self {
        Self::with_registry(executor, config, Registry::global())
    }

    pub fn with_registry(executor: E, config: Config, registry: Arc<Registry>) -> Self {
        let mapper = Mapper::new(registry, config.mapping.clone());
        Self {
            executor,
            config,
            mapper,
        }
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut Mapper {
        &mut self.mapper
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Text command with positional arguments bound to the names found in it
    pub fn positional(&self, sql: &str, args: Vec<Arg>) -> Result<Command> {
        let mut command = Command::text(sql);
        command.bind_positional_with(args, &self.config.scan)?;
        Ok(command)
    }
}

impl<E: Executor> Session<E> {
    /// Runs a command and lazily maps its rows into `T`
    pub fn run<T: Mapped>(&mut self, command: &Command) -> Result<MapRows<T, E::Rows>> {
        tracing::debug!(text = %command.text, "running query");
        let rows = self.executor.query(command)?;
        self.mapper.map(rows)
    }

    pub fn query<T: Mapped>(
        &mut self,
        sql: &str,
        parameters: Parameters,
    ) -> Result<MapRows<T, E::Rows>> {
        let command = Command::text(sql).with_parameters(parameters);
        self.run(&command)
    }

    pub fn query_positional<T: Mapped>(
        &mut self,
        sql: &str,
        args: Vec<Arg>,
    ) -> Result<MapRows<T, E::Rows>> {
        let command = self.positional(sql, args)?;
        self.run(&command)
    }

    /// First mapped row, if any; the rest of the result is not read
    pub fn query_first<T: Mapped>(
        &mut self,
        sql: &str,
        parameters: Parameters,
    ) -> Result<Option<T>> {
        self.query(sql, parameters)?.next().transpose()
    }

    pub fn execute(&mut self, sql: &str, parameters: Parameters) -> Result<u64> {
        let command = Command::text(sql).with_parameters(parameters);
        self.executor.execute(&command)
    }

    pub fn execute_command(&mut self, command: &Command) -> Result<u64> {
        self.executor.execute(command)
    }
}

impl<E: AsyncExecutor> Session<E> {
    pub async fn run_async<T: Mapped>(
        &mut self,
        command: &Command,
    ) -> Result<MapStream<T, E::Stream>> {
        tracing::debug!(text = %command.text, "running async query");
        let rows = self.executor.query_async(command).await?;
        self.mapper.map_stream(rows)
    }

    pub async fn query_async<T: Mapped>(
        &mut self,
        sql: &str,
        parameters: Parameters,
    ) -> Result<MapStream<T, E::Stream>> {
        let command = Command::text(sql).with_parameters(parameters);
        self.run_async(&command).await
    }
}
