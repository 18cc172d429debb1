use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::{Stream, ready};
use tokio_util::sync::CancellationToken;

use crate::{
    config::MapOptions,
    error::{Error, Result},
    mapping::{Mapped, Registry, binder::RowPlan},
    sql::types::Row,
};

/// Mapping state shared by the blocking and async adapters
///
/// The plan is resolved from the first row's columns and reused for every
/// later row; all rows of one result set are assumed to share a column list.
pub(crate) struct Cursor<T> {
    registry: Arc<Registry>,
    options: MapOptions,
    cancel: Option<CancellationToken>,
    plan: Option<Arc<RowPlan<T>>>,
    done: bool,
}

impl<T: Mapped> Cursor<T> {
    pub(crate) fn new(
        registry: Arc<Registry>,
        options: MapOptions,
        cancel: Option<CancellationToken>,
    ) -> Self {
        Self {
            registry,
            options,
            cancel,
            plan: None,
            done: false,
        }
    }

    /// Cancellation is observed between rows; once seen, the cursor is done
    fn cancelled(&mut self) -> bool {
        let cancelled = self.cancel.as_ref().is_some_and(|t| t.is_cancelled());
        if cancelled {
            tracing::debug!("row mapping cancelled");
            self.done = true;
        }
        cancelled
    }

    /// Maps one fetched row. Any error ends the sequence.
    fn map(&mut self, row: Result<Row>) -> Result<T> {
        let result = row.and_then(|row| {
            let plan = match self.plan.take() {
                Some(plan) => plan,
                None => self.registry.plan::<T>(row.columns(), &self.options)?,
            };
            let mapped = plan.materialize(row, &self.options);
            self.plan = Some(plan);
            mapped
        });
        if result.is_err() {
            self.done = true;
        }
        result
    }
}

/// Lazily maps a row iterator into `T`s
///
/// Forward-only and consumed once. Rows are pulled from the source only
/// as the caller advances.
pub struct MapRows<T, I> {
    rows: I,
    cursor: Cursor<T>,
}

impl<T: Mapped, I> MapRows<T, I> {
    pub(crate) fn new(rows: I, cursor: Cursor<T>) -> Self {
        Self { rows, cursor }
    }
}

impl<T, I> Iterator for MapRows<T, I>
where
    T: Mapped,
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.done {
            return None;
        }
        if self.cursor.cancelled() {
            return Some(Err(Error::Cancelled));
        }
        match self.rows.next() {
            Some(row) => Some(self.cursor.map(row)),
            None => {
                self.cursor.done = true;
                None
            }
        }
    }
}

/// Async counterpart of [`MapRows`] over a row stream
pub struct MapStream<T, S> {
    rows: S,
    cursor: Cursor<T>,
}

impl<T: Mapped, S> MapStream<T, S> {
    pub(crate) fn new(rows: S, cursor: Cursor<T>) -> Self {
        Self { rows, cursor }
    }
}

impl<T, S> Stream for MapStream<T, S>
where
    T: Mapped,
    S: Stream<Item = Result<Row>> + Unpin,
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cursor.done {
            return Poll::Ready(None);
        }
        if this.cursor.cancelled() {
            return Poll::Ready(Some(Err(Error::Cancelled)));
        }
        match ready!(Pin::new(&mut this.rows).poll_next(cx)) {
            Some(row) => Poll::Ready(Some(this.cursor.map(row))),
            None => {
                this.cursor.done = true;
                Poll::Ready(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::{StreamExt, TryStreamExt, stream};
    use tokio_util::sync::CancellationToken;

    use crate::{
        config::{EnumMembership, MapOptions},
        error::{Error, Result},
        mapping::{Mapper, Registry, SqlEnum},
        sql::types::{Columns, Row, Value},
    };

    crate::sql_enum! {
        pub enum Status: i16 { Active = 1, Suspended = 2 }
    }

    crate::mapped! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Member {
            pub id: i32,
            pub nickname: Option<String>,
            pub score: i64,
            pub status: Status,
        }
    }

    fn columns() -> Columns {
        ["id", "nickname", "score", "status"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn rows(count: usize) -> impl Iterator<Item = Result<Row>> {
        let columns = columns();
        (0..count).map(move |i| {
            Row::new(
                columns.clone(),
                vec![
                    Value::Int32(i as i32),
                    if i % 2 == 0 { Value::Null } else { Value::from(format!("m{}", i)) },
                    Value::Int64(i as i64 * 10),
                    Value::Int16(1),
                ],
            )
        })
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn mapper() -> Mapper {
        Mapper::new(Arc::new(Registry::new()), MapOptions::default())
    }

    #[test]
    fn test_map_rows() -> Result<()> {
        let members = mapper().map::<Member, _>(rows(3))?.collect::<Result<Vec<_>>>()?;
        assert_eq!(
            members,
            vec![
                Member { id: 0, nickname: None, score: 0, status: Status::Active },
                Member { id: 1, nickname: Some("m1".to_string()), score: 10, status: Status::Active },
                Member { id: 2, nickname: None, score: 20, status: Status::Active },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_no_introspection_after_first_row() -> Result<()> {
        let mapper = mapper();
        let mut mapped = mapper.map::<Member, _>(rows(10_000))?;

        mapped.next().transpose()?;
        let after_first = mapper.registry().stats();
        assert_eq!(after_first.classifications, 1);
        assert_eq!(after_first.plans, 1);
        assert_eq!(after_first.field_bindings, 4);

        assert_eq!(mapped.try_fold(1, |n, m| m.map(|_| n + 1))?, 10_000);
        assert_eq!(mapper.registry().stats(), after_first);

        // A second result set with the same columns reuses the cached plan
        mapper.map::<Member, _>(rows(5))?.collect::<Result<Vec<_>>>()?;
        assert_eq!(mapper.registry().stats(), after_first);
        Ok(())
    }

    #[test]
    fn test_lazy_source() -> Result<()> {
        let mut pulled = 0;
        let source = rows(100).inspect(|_| pulled += 1);
        let first = mapper()
            .map::<Member, _>(source)?
            .take(2)
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(first.len(), 2);
        assert_eq!(pulled, 2);
        Ok(())
    }

    #[test]
    fn test_simple_and_tuple_results() -> Result<()> {
        let mapper = mapper();
        let ids = mapper.map::<i32, _>(rows(3))?.collect::<Result<Vec<_>>>()?;
        assert_eq!(ids, vec![0, 1, 2]);

        let pairs = mapper
            .map::<(i32, Option<String>), _>(rows(2))?
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(pairs, vec![(0, None), (1, Some("m1".to_string()))]);
        Ok(())
    }

    #[test]
    fn test_enum_values() -> Result<()> {
        init_tracing();
        let columns: Columns = ["status"].iter().map(|c| c.to_string()).collect();
        let source = vec![
            Row::new(columns.clone(), vec![Value::from("Suspended")]),
            Row::new(columns.clone(), vec![Value::Int32(999)]),
        ];
        let statuses = mapper()
            .map::<Status, _>(source.clone())?
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(statuses, vec![Status::Suspended, Status(999)]);
        assert_eq!(statuses[1].raw(), 999);

        let strict = Mapper::new(
            Arc::new(Registry::new()),
            MapOptions {
                enum_membership: EnumMembership::Strict,
                ..MapOptions::default()
            },
        );
        let mut mapped = strict.map::<Status, _>(source)?;
        assert_eq!(mapped.next().transpose()?, Some(Status::Suspended));
        let err = mapped.next().transpose().expect_err("999 is not a member");
        assert!(matches!(err.root_cause(), Error::EnumOutOfRange { value: 999, .. }));
        assert!(mapped.next().is_none());
        Ok(())
    }

    #[test]
    fn test_unknown_enum_name() -> Result<()> {
        let columns: Columns = ["status"].iter().map(|c| c.to_string()).collect();
        let source = vec![Row::new(columns, vec![Value::from("Deleted")])];
        let err = mapper()
            .map::<Status, _>(source)?
            .next()
            .transpose()
            .expect_err("Deleted is not a member");
        assert!(matches!(err.root_cause(), Error::UnknownEnumMember { .. }));
        Ok(())
    }

    #[test]
    fn test_shape_error_before_rows() {
        crate::mapped! {
            pub struct Pair {
                pub a: i32,
            }
        }
        let result = mapper().map::<(i32, Pair), _>(rows(1));
        assert!(matches!(result, Err(Error::Shape(_))));
    }

    #[test]
    fn test_source_error_ends_sequence() -> Result<()> {
        let source = vec![
            Err(Error::Internal("connection reset".to_string())),
            rows(1).next().unwrap_or_else(|| Err(Error::Cancelled)),
        ];
        let mut mapped = mapper().map::<Member, _>(source)?;
        assert!(matches!(mapped.next(), Some(Err(Error::Internal(_)))));
        assert!(mapped.next().is_none());
        Ok(())
    }

    #[test]
    fn test_cancellation() -> Result<()> {
        let token = CancellationToken::new();
        let mut mapped = mapper()
            .with_cancellation(token.clone())
            .map::<Member, _>(rows(10))?;

        assert!(mapped.next().transpose()?.is_some());
        token.cancel();
        assert!(matches!(mapped.next(), Some(Err(Error::Cancelled))));
        assert!(mapped.next().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_map_stream() -> Result<()> {
        let mapper = mapper();
        let mapped = mapper.map_stream::<Member, _>(stream::iter(rows(4)))?;
        let members: Vec<Member> = mapped.try_collect().await?;
        assert_eq!(members.len(), 4);
        assert_eq!(members[3].nickname.as_deref(), Some("m3"));
        assert_eq!(mapper.registry().stats().plans, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_stream_cancellation() -> Result<()> {
        let token = CancellationToken::new();
        let mut mapped = mapper()
            .with_cancellation(token.clone())
            .map_stream::<Member, _>(stream::iter(rows(10)))?;

        assert!(mapped.next().await.transpose()?.is_some());
        token.cancel();
        assert!(matches!(mapped.next().await, Some(Err(Error::Cancelled))));
        assert!(mapped.next().await.is_none());
        Ok(())
    }
}
