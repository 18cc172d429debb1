use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use futures::stream::{self, Iter};
use serde::{Deserialize, Serialize};

use crate::{
    engine::{AsyncExecutor, Executor},
    error::{Error, Result},
    sql::{
        params::Command,
        types::{Columns, Row, Value},
    },
};

/// One recorded result: column names and row values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Result sets and affected-row counts keyed by command text
///
/// Persisted with bincode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    results: BTreeMap<String, ResultSet>,
    affected: BTreeMap<String, u64>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, text: impl Into<String>, result: ResultSet) -> &mut Self {
        self.results.insert(key(&text.into()), result);
        self
    }

    pub fn record_execute(&mut self, text: impl Into<String>, affected: u64) -> &mut Self {
        self.affected.insert(key(&text.into()), affected);
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(bincode::deserialize_from(BufReader::new(file))?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }
}

fn key(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rows of one recorded result, handed out one at a time
pub struct ReplayRows {
    columns: Columns,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl Iterator for ReplayRows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows
            .next()
            .map(|values| Row::new(self.columns.clone(), values))
    }
}

/// Executor that answers commands from a [`Recording`]
///
/// Every command received is kept, so callers can inspect exactly what
/// text and parameters were sent.
#[derive(Debug, Default)]
pub struct ReplayExecutor {
    recording: Recording,
    commands: Vec<Command>,
}

impl ReplayExecutor {
    pub fn new(recording: Recording) -> Self {
        Self {
            recording,
            commands: Vec::new(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Recording::load(path)?))
    }

    /// Commands received so far, oldest first
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn rows(&mut self, command: &Command) -> Result<ReplayRows> {
        self.commands.push(command.clone());
        let result = self
            .recording
            .results
            .get(&key(&command.text))
            .cloned()
            .ok_or_else(|| Error::Internal(format!("no recorded result for {}", command.text)))?;
        Ok(ReplayRows {
            columns: result.columns.into(),
            rows: result.rows.into_iter(),
        })
    }
}

impl Executor for ReplayExecutor {
    type Rows = ReplayRows;

    fn query(&mut self, command: &Command) -> Result<Self::Rows> {
        self.rows(command)
    }

    fn execute(&mut self, command: &Command) -> Result<u64> {
        self.commands.push(command.clone());
        Ok(self
            .recording
            .affected
            .get(&key(&command.text))
            .copied()
            .unwrap_or_default())
    }
}

impl AsyncExecutor for ReplayExecutor {
    type Stream = Iter<ReplayRows>;

    async fn query_async(&mut self, command: &Command) -> Result<Self::Stream> {
        Ok(stream::iter(self.rows(command)?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::TryStreamExt;
    use tokio_util::sync::CancellationToken;

    use super::{Recording, ReplayExecutor, ResultSet};
    use crate::{
        config::Config,
        engine::{Executor, Session},
        error::{Error, Result},
        mapping::{Nested, Registry},
        sql::{
            params::{Arg, CommandType, Parameters},
            types::Value,
        },
    };

    crate::sql_enum! {
        pub enum Tier: i32 { Bronze = 1, Silver = 2, Gold = 3 }
    }

    crate::mapped! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Customer {
            pub customer_id: i32,
            pub name: String,
            pub email: Option<String>,
            pub tier: Tier,
            pub referrer: Nested<Customer>,
        }
    }

    const SELECT: &str = "select customer_id, name, email, tier from customers where tier >= @tier";

    fn recording() -> Recording {
        let mut recording = Recording::new();
        recording
            .record(
                SELECT,
                ResultSet {
                    columns: vec![
                        "customer_id".to_string(),
                        "name".to_string(),
                        "email".to_string(),
                        "tier".to_string(),
                    ],
                    rows: vec![
                        vec![Value::Int32(1), Value::from("Ada"), Value::Null, Value::from("Gold")],
                        vec![
                            Value::Int32(2),
                            Value::from("Grace"),
                            Value::from("grace@example.com"),
                            Value::Int32(2),
                        ],
                    ],
                },
            )
            .record(
                "select count(*) from customers",
                ResultSet {
                    columns: vec!["".to_string()],
                    rows: vec![vec![Value::Int64(2)]],
                },
            )
            .record_execute("delete from customers where customer_id = @id", 1);
        recording
    }

    fn session() -> Session<ReplayExecutor> {
        Session::with_registry(
            ReplayExecutor::new(recording()),
            Config::default(),
            Arc::new(Registry::new()),
        )
    }

    #[test]
    fn test_query_mapped() -> Result<()> {
        let mut session = session();
        let mut params = Parameters::new();
        params.add("tier", Value::Int32(2));

        let customers = session
            .query::<Customer>(SELECT, params)?
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].name, "Ada");
        assert_eq!(customers[0].email, None);
        assert_eq!(customers[0].tier, Tier::Gold);
        assert_eq!(customers[1].tier, Tier::Silver);
        assert_eq!(customers[1].referrer, Nested(None));

        let sent = &session.executor().commands()[0];
        assert_eq!(sent.parameters.get("tier").map(|p| &p.value), Some(&Value::Int32(2)));
        Ok(())
    }

    #[test]
    fn test_query_positional() -> Result<()> {
        let mut session = session();
        let names = session
            .query_positional::<(i32, String)>(SELECT, vec![Arg::Value(Value::Int32(1))])?
            .map(|r| r.map(|(_, name)| name))
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(names, vec!["Ada", "Grace"]);

        assert!(matches!(
            session.query_positional::<i32>(SELECT, vec![]),
            Err(Error::ParameterCount { expected: 1, actual: 0 })
        ));
        Ok(())
    }

    #[test]
    fn test_query_first_and_execute() -> Result<()> {
        let mut session = session();
        assert_eq!(
            session.query_first::<i64>("select count(*)\n  from customers", Parameters::new())?,
            Some(2)
        );

        let mut params = Parameters::new();
        params.add("id", Value::Int32(1));
        assert_eq!(
            session.execute("delete from customers where customer_id = @id", params)?,
            1
        );
        assert_eq!(session.execute("update nothing", Parameters::new())?, 0);
        assert_eq!(session.executor().commands().len(), 3);
        assert_eq!(
            session.executor().commands()[1].command_type,
            CommandType::Text
        );

        assert!(matches!(
            session.query_first::<i64>("select 1", Parameters::new()),
            Err(Error::Internal(_))
        ));
        Ok(())
    }

    #[test]
    fn test_persisted_recording() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("customers.rec");
        recording().save(&path)?;

        let loaded = Recording::load(&path)?;
        assert_eq!(loaded, recording());

        let mut session = ReplayExecutor::load(&path)?.session(Config::default());
        let mut params = Parameters::new();
        params.add("tier", Value::Int32(1));
        let ids = session
            .query::<i32>(SELECT, params)?
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(ids, vec![1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_query_async() -> Result<()> {
        let mut session = session();
        let customers: Vec<Customer> = session
            .query_async::<Customer>(SELECT, Parameters::new())
            .await?
            .try_collect()
            .await?;
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[1].email.as_deref(), Some("grace@example.com"));
        Ok(())
    }

    #[tokio::test]
    async fn test_query_async_cancelled() -> Result<()> {
        let mut session = session();
        let token = CancellationToken::new();
        token.cancel();
        *session.mapper_mut() = session.mapper().clone().with_cancellation(token);

        let result: Result<Vec<Customer>> = session
            .query_async::<Customer>(SELECT, Parameters::new())
            .await?
            .try_collect()
            .await;
        assert_eq!(result, Err(Error::Cancelled));
        Ok(())
    }
}
