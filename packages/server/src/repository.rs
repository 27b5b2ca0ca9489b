use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use common::query::{PageRange, SortDirection, SortField};
use common::record::{Applicant, IpClass, NamedRef};
use common::repository::{CertificateRef, RecordPage, RecordRepository, RepositoryError};
use common::{FilingRecord, RecordFilters, RelationSet, Sort};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::extension::postgres::PgFunc;
use sea_orm::sea_query::{Func, LikeExpr, LockType, Query as SeaQuery};
use sea_orm::*;

use crate::entity::{
    applicant, filing_record, filing_status, ip_class, ip_type, proposing_agency,
};
use crate::models::shared::escape_like;

/// Record queries against the relational store.
pub struct DbRecordRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DbRecordRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// A single record with every relation, or `None` when the id is unknown.
    pub async fn find_one(&self, id: i32) -> Result<Option<FilingRecord>, DbErr> {
        let Some(row) = filing_record::Entity::find_by_id(id).one(self.db).await? else {
            return Ok(None);
        };
        Ok(self.attach(vec![row], RelationSet::ALL).await?.pop())
    }

    /// Load the requested relations of `rows` in one batched query per
    /// relation and assemble the records, preserving row order.
    async fn attach(
        &self,
        rows: Vec<filing_record::Model>,
        relations: RelationSet,
    ) -> Result<Vec<FilingRecord>, DbErr> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let applicant_ids = distinct(relations.applicant, rows.iter().map(|r| r.applicant_id));
        let type_ids = distinct(relations.ip_type, rows.iter().map(|r| r.ip_type_id));
        let status_ids = distinct(relations.status, rows.iter().map(|r| r.status_id));
        let agency_ids = distinct(relations.agency, rows.iter().map(|r| r.agency_id));
        let class_ids = distinct(relations.ip_class, rows.iter().filter_map(|r| r.ip_class_id));

        let (applicants, ip_types, statuses, agencies, classes) = tokio::try_join!(
            lookup::<applicant::Entity, _>(self.db, applicant::Column::Id, applicant_ids, |m| {
                (m.id, Applicant { id: m.id, name: m.name, address: m.address })
            }),
            lookup::<ip_type::Entity, _>(self.db, ip_type::Column::Id, type_ids, |m| {
                (m.id, NamedRef { id: m.id, name: m.name })
            }),
            lookup::<filing_status::Entity, _>(self.db, filing_status::Column::Id, status_ids, |m| {
                (m.id, NamedRef { id: m.id, name: m.name })
            }),
            lookup::<proposing_agency::Entity, _>(
                self.db,
                proposing_agency::Column::Id,
                agency_ids,
                |m| (m.id, NamedRef { id: m.id, name: m.name }),
            ),
            lookup::<ip_class::Entity, _>(self.db, ip_class::Column::Id, class_ids, |m| {
                (m.id, IpClass { id: m.id, name: m.name, kind: m.kind })
            }),
        )?;

        Ok(rows
            .into_iter()
            .map(|row| FilingRecord {
                applicant: applicants.get(&row.applicant_id).cloned(),
                ip_type: ip_types.get(&row.ip_type_id).cloned(),
                status: statuses.get(&row.status_id).cloned(),
                agency: agencies.get(&row.agency_id).cloned(),
                ip_class: row.ip_class_id.and_then(|id| classes.get(&id).cloned()),
                id: row.id,
                title: row.title,
                product_category: row.product_category,
                facilitation_year: row.facilitation_year,
                certificate_path: row.certificate_path,
                notes: row.notes,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

/// `column = ANY($1)` with every id bound as a single array parameter.
/// A plain `IN (...)` binds one parameter per id and breaks past the
/// PostgreSQL limit of 65535 bind parameters.
fn id_in<C: ColumnTrait>(column: C, ids: &[i32]) -> Condition {
    Condition::all().add(Expr::col(column).eq(PgFunc::any(Expr::val(ids.to_vec()))))
}

/// Distinct ids to look up, or none when the relation is not wanted.
fn distinct(wanted: bool, ids: impl Iterator<Item = i32>) -> Vec<i32> {
    if !wanted {
        return vec![];
    }
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}

async fn lookup<E, T>(
    db: &DatabaseConnection,
    id_column: E::Column,
    ids: Vec<i32>,
    convert: fn(E::Model) -> (i32, T),
) -> Result<HashMap<i32, T>, DbErr>
where
    E: EntityTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(E::find()
        .filter(id_in(id_column, &ids))
        .all(db)
        .await?
        .into_iter()
        .map(convert)
        .collect())
}

fn sort_column(field: SortField) -> filing_record::Column {
    match field {
        SortField::CreatedAt => filing_record::Column::CreatedAt,
        SortField::Title => filing_record::Column::Title,
        SortField::Year => filing_record::Column::FacilitationYear,
    }
}

fn sort_order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// Apply `sort` with identifier descending as the tiebreak.
fn ordered(select: Select<filing_record::Entity>, sort: Sort) -> Select<filing_record::Entity> {
    select
        .order_by(sort_column(sort.field), sort_order(sort.direction))
        .order_by_desc(filing_record::Column::Id)
}

fn filtered(filters: &RecordFilters) -> Select<filing_record::Entity> {
    let mut select = filing_record::Entity::find();

    if let Some(term) = filters.search_term() {
        let pattern = format!("%{}%", escape_like(term).to_lowercase());
        select = select.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(filing_record::Column::Title)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    filing_record::Column::ApplicantId.in_subquery(
                        SeaQuery::select()
                            .column(applicant::Column::Id)
                            .from(applicant::Entity)
                            .and_where(
                                Expr::expr(Func::lower(Expr::col((
                                    applicant::Entity,
                                    applicant::Column::Name,
                                ))))
                                .like(LikeExpr::new(pattern).escape('\\')),
                            )
                            .to_owned(),
                    ),
                ),
        );
    }
    if let Some(id) = filters.type_id {
        select = select.filter(filing_record::Column::IpTypeId.eq(id));
    }
    if let Some(id) = filters.status_id {
        select = select.filter(filing_record::Column::StatusId.eq(id));
    }
    if let Some(year) = filters.year {
        select = select.filter(filing_record::Column::FacilitationYear.eq(year));
    }
    if let Some(id) = filters.agency_id {
        select = select.filter(filing_record::Column::AgencyId.eq(id));
    }

    select
}

#[async_trait]
impl RecordRepository for DbRecordRepository<'_> {
    async fn search_ids(&self, filters: &RecordFilters) -> Result<Vec<i32>, RepositoryError> {
        filtered(filters)
            .select_only()
            .column(filing_record::Column::Id)
            .into_tuple::<i32>()
            .all(self.db)
            .await
            .map_err(RepositoryError::new)
    }

    async fn fetch_page(&self, sort: Sort, range: PageRange) -> Result<RecordPage, RepositoryError> {
        let total_count = filing_record::Entity::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::new)?;

        let rows = ordered(filing_record::Entity::find(), sort)
            .offset(range.offset)
            .limit(range.limit)
            .all(self.db)
            .await
            .map_err(RepositoryError::new)?;

        let records = self
            .attach(rows, RelationSet::ALL)
            .await
            .map_err(RepositoryError::new)?;

        Ok(RecordPage {
            records,
            total_count,
        })
    }

    async fn hydrate(
        &self,
        ids: &[i32],
        sort: Sort,
        range: Option<PageRange>,
        relations: RelationSet,
    ) -> Result<Vec<FilingRecord>, RepositoryError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut select = ordered(
            filing_record::Entity::find().filter(id_in(filing_record::Column::Id, ids)),
            sort,
        );
        if let Some(range) = range {
            select = select.offset(range.offset).limit(range.limit);
        }

        let rows = select.all(self.db).await.map_err(RepositoryError::new)?;
        self.attach(rows, relations)
            .await
            .map_err(RepositoryError::new)
    }

    async fn certificate_paths(&self, ids: &[i32]) -> Result<Vec<CertificateRef>, RepositoryError> {
        let rows: Vec<(i32, Option<String>)> = filing_record::Entity::find()
            .select_only()
            .column(filing_record::Column::Id)
            .column(filing_record::Column::CertificatePath)
            .filter(id_in(filing_record::Column::Id, ids))
            .into_tuple()
            .all(self.db)
            .await
            .map_err(RepositoryError::new)?;

        Ok(rows
            .into_iter()
            .map(|(record_id, path)| CertificateRef { record_id, path })
            .collect())
    }

    async fn delete_rows(&self, ids: &[i32]) -> Result<Vec<i32>, RepositoryError> {
        let txn = self.db.begin().await.map_err(RepositoryError::new)?;

        let existing: Vec<i32> = filing_record::Entity::find()
            .select_only()
            .column(filing_record::Column::Id)
            .filter(id_in(filing_record::Column::Id, ids))
            .lock(LockType::Update)
            .into_tuple()
            .all(&txn)
            .await
            .map_err(RepositoryError::new)?;

        if !existing.is_empty() {
            filing_record::Entity::delete_many()
                .filter(id_in(filing_record::Column::Id, &existing))
                .exec(&txn)
                .await
                .map_err(RepositoryError::new)?;
        }

        txn.commit().await.map_err(RepositoryError::new)?;
        Ok(existing)
    }
}
