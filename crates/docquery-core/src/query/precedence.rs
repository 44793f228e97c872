//! Logical combinators
//!
//! Precedence is implemented by restructuring the filter tree instead of
//! parsing: every join moves the current top-level filter into the first
//! slot of a new `$and` / `$nor` / `$or` list. Which query performs the join
//! decides the nesting:
//!
//! - AND always joins on the handle it is called on.
//! - NOR moves up to the parent when the parent holds an `$and`, so the AND
//!   ends up as a single operand of the NOR.
//! - OR always moves up to the top-level query and wraps everything.

use std::rc::Rc;

use tracing::debug;

use super::{Query, Scope};
use crate::filter::{shared, Clause, Filter, LogicalOperator};

/// Something that can be combined with a query.
#[derive(Debug)]
pub enum Operand {
    /// Another query; its own filter is copied in
    Query(Query),
    /// A raw filter document
    Filter(Filter),
}

impl Operand {
    fn into_filter(self) -> Filter {
        match self {
            Operand::Query(query) => {
                let filter = query.filter.borrow().clone();
                filter
            }
            Operand::Filter(filter) => filter,
        }
    }
}

impl From<Query> for Operand {
    fn from(query: Query) -> Self {
        Operand::Query(query)
    }
}

impl From<&Query> for Operand {
    fn from(query: &Query) -> Self {
        Operand::Filter(query.filter())
    }
}

impl From<Filter> for Operand {
    fn from(filter: Filter) -> Self {
        Operand::Filter(filter)
    }
}

fn collect_filters<I>(operands: I) -> Vec<Filter>
where
    I: IntoIterator,
    I::Item: Into<Operand>,
{
    operands
        .into_iter()
        .map(|operand| operand.into().into_filter())
        .collect()
}

impl Query {
    /// Open a branch whose filter is AND-ed with everything built so far.
    pub fn and(self) -> Query {
        self.join(LogicalOperator::And, Vec::new())
    }

    /// AND the current filter with `operands`.
    ///
    /// An empty operand list behaves like [`Query::and`].
    pub fn and_with<I>(self, operands: I) -> Query
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        self.join(LogicalOperator::And, collect_filters(operands))
    }

    /// Open a branch whose filter is NOR-ed with everything built so far.
    pub fn nor(self) -> Query {
        self.nor_filters(Vec::new())
    }

    /// NOR the current filter with `operands`.
    pub fn nor_with<I>(self, operands: I) -> Query
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        self.nor_filters(collect_filters(operands))
    }

    /// Open a branch whose filter is OR-ed with everything built so far.
    pub fn or(self) -> Query {
        self.or_filters(Vec::new())
    }

    /// OR the whole query with `operands`.
    pub fn or_with<I>(self, operands: I) -> Query
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        self.or_filters(collect_filters(operands))
    }

    fn nor_filters(self, operands: Vec<Filter>) -> Query {
        let Query { filter, scope } = self;
        match scope {
            Scope::Branch(parent)
                if parent
                    .filter
                    .borrow()
                    .contains_key(LogicalOperator::And.key()) =>
            {
                debug!("nor follows an and-join, applying on parent");
                parent.nor_filters(operands)
            }
            scope => Query { filter, scope }.join(LogicalOperator::Nor, operands),
        }
    }

    fn or_filters(self, operands: Vec<Filter>) -> Query {
        let Query { filter, scope } = self;
        match scope {
            Scope::Branch(parent) => {
                debug!("or applies to the parent query");
                parent.or_filters(operands)
            }
            scope => Query { filter, scope }.join(LogicalOperator::Or, operands),
        }
    }

    /// Move the current filter into the first slot of `operator`'s list,
    /// followed by `operands`. With no operands a fresh branch takes the
    /// second slot and is returned.
    fn join(self, operator: LogicalOperator, operands: Vec<Filter>) -> Query {
        let current = self.filter.borrow_mut().take();

        if operands.is_empty() {
            debug!(%operator, "opening branch");
            let branch = shared(Filter::new());
            self.filter.borrow_mut().set_clause(
                operator.key().to_string(),
                Clause::Logical(vec![shared(current), Rc::clone(&branch)]),
            );
            return Query {
                filter: branch,
                scope: Scope::Branch(Box::new(self)),
            };
        }

        debug!(%operator, operands = operands.len(), "joining filters");
        let mut filters = Vec::with_capacity(operands.len() + 1);
        filters.push(shared(current));
        filters.extend(operands.into_iter().map(shared));
        self.filter
            .borrow_mut()
            .set_clause(operator.key().to_string(), Clause::Logical(filters));
        self
    }
}
