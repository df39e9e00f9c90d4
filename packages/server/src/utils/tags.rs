use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::entity::{tag, work_tag};

/// Split a comma-separated tag field into clean names.
///
/// Names are trimmed, blanks dropped, and exact duplicates removed keeping
/// the first occurrence. Comparison is case-sensitive.
pub fn normalize_tags(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Link `names` to a work, creating missing tags.
///
/// Safe against a concurrent writer creating the same tag: inserts skip
/// conflicts and ids are read back by name.
pub async fn connect_tags<C: ConnectionTrait>(
    conn: &C,
    work_id: i32,
    names: &[String],
) -> Result<(), DbErr> {
    if names.is_empty() {
        return Ok(());
    }

    for name in names {
        let result = tag::Entity::insert(tag::ActiveModel {
            name: Set(name.clone()),
            ..Default::default()
        })
        .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    let tag_ids: Vec<i32> = tag::Entity::find()
        .filter(tag::Column::Name.is_in(names.iter().cloned()))
        .select_only()
        .column(tag::Column::Id)
        .into_tuple::<i32>()
        .all(conn)
        .await?;

    for tag_id in tag_ids {
        let result = work_tag::Entity::insert(work_tag::ActiveModel {
            work_id: Set(work_id),
            tag_id: Set(tag_id),
        })
        .on_conflict(
            OnConflict::columns([work_tag::Column::WorkId, work_tag::Column::TagId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// Replace a work's tag set wholesale. Tags left without works are kept.
pub async fn replace_tags<C: ConnectionTrait>(
    conn: &C,
    work_id: i32,
    names: &[String],
) -> Result<(), DbErr> {
    work_tag::Entity::delete_many()
        .filter(work_tag::Column::WorkId.eq(work_id))
        .exec(conn)
        .await?;
    connect_tags(conn, work_id, names).await
}
