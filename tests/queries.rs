//! End-to-end execution against in-memory SQLite: builder in, mapped rows
//! out.

#![cfg(feature = "rusqlite")]

mod common;

use trellis::expr::{avg, count_all, eq, gt, max, min, sum};
use trellis::{
    CancelToken, Error, Executor, Path, Query, Result, ResultRow, Value, asc, desc,
};

fn connection() -> rusqlite::Connection {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE team (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE member (
             id INTEGER PRIMARY KEY,
             username TEXT,
             age INTEGER NOT NULL,
             team_id INTEGER REFERENCES team (id)
         );
         INSERT INTO team (id, name) VALUES (1, 'teamA'), (2, 'teamB');
         INSERT INTO member (id, username, age, team_id) VALUES
             (1, 'member1', 10, 1),
             (2, 'member2', 20, 1),
             (3, 'member3', 30, 2),
             (4, 'member4', 40, 2);",
    )
    .unwrap();
    conn
}

fn member() -> Result<Path> {
    Path::root(common::metamodel(), "Member", "m")
}

fn username(row: &ResultRow) -> String {
    row.as_entity()
        .and_then(|entity| entity.get("username"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[test]
fn fetch_one_returns_the_single_match() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;

    let row = Query::select_from(&m)
        .r#where(eq(m.field("username")?, "member1")?)?
        .fetch_one(&executor)?;
    let entity = row.as_entity().unwrap();
    assert_eq!(entity.entity(), "Member");
    assert_eq!(entity.get("age"), Some(&Value::Int(10)));
    Ok(())
}

#[test]
fn fetch_one_cardinality_errors() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;

    let none = Query::select_from(&m)
        .r#where(eq(m.field("username")?, "nobody")?)?
        .fetch_one(&executor);
    assert!(matches!(none, Err(Error::NoResult)));

    let many = Query::select_from(&m).fetch_one(&executor);
    assert!(matches!(many, Err(Error::NonUniqueResult)));
    Ok(())
}

#[test]
fn fetch_first_tolerates_empty_results() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;

    let none = Query::select_from(&m)
        .r#where(gt(m.field("age")?, 100)?)?
        .fetch_first(&executor)?;
    assert!(none.is_none());

    let first = Query::select_from(&m)
        .order_by([asc(m.field("age")?)])
        .fetch_first(&executor)?
        .unwrap();
    assert_eq!(username(&first), "member1");
    Ok(())
}

#[test]
fn pagination_window_skips_and_caps() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;

    let rows = Query::select_from(&m)
        .order_by([asc(m.field("username")?)])
        .offset(1)?
        .limit(2)?
        .fetch_all(&executor)?;
    let names: Vec<String> = rows.iter().map(username).collect();
    assert_eq!(names, ["member2", "member3"]);
    Ok(())
}

#[test]
fn sort_with_nulls_last() -> Result<()> {
    let conn = connection();
    conn.execute_batch(
        "INSERT INTO member (id, username, age, team_id) VALUES
             (5, 'member5', 100, NULL),
             (6, 'member6', 100, NULL),
             (7, NULL, 100, NULL);",
    )
    .unwrap();
    let executor = Executor::new(&conn);
    let m = member()?;

    let rows = Query::select_from(&m)
        .r#where(eq(m.field("age")?, 100)?)?
        .order_by([
            desc(m.field("age")?),
            asc(m.field("username")?).nulls_last(),
        ])
        .fetch_all(&executor)?;
    let names: Vec<String> = rows.iter().map(username).collect();
    assert_eq!(names, ["member5", "member6", ""]);
    assert_eq!(
        rows[2].as_entity().unwrap().get("username"),
        Some(&Value::Null)
    );
    Ok(())
}

#[test]
fn aggregate_tuple_over_all_members() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;
    let age = m.field("age")?;

    let row = Query::new()
        .select([count_all(), sum(&age)?, avg(&age)?, max(&age)?, min(&age)?])
        .from([m.clone()])
        .fetch_one(&executor)?;
    let tuple = row.as_tuple().unwrap();
    assert_eq!(tuple.at(0).unwrap().as_scalar(), Some(&Value::Int(4)));
    assert_eq!(tuple.at(1).unwrap().as_scalar(), Some(&Value::Int(100)));
    assert_eq!(tuple.at(2).unwrap().as_scalar(), Some(&Value::Float(25.0)));
    assert_eq!(tuple.at(3).unwrap().as_scalar(), Some(&Value::Int(40)));
    assert_eq!(tuple.at(4).unwrap().as_scalar(), Some(&Value::Int(10)));
    Ok(())
}

#[test]
fn group_by_team_averages() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;
    let team = m.relate("team")?;
    let name = team.field("name")?;

    let rows = Query::new()
        .select([name.clone().into(), trellis::aliased(avg(m.field("age")?)?, "avg_age")])
        .from([m.clone()])
        .join(&team, "t")
        .group_by([&name])
        .order_by([asc(&name)])
        .fetch_all(&executor)?;
    assert_eq!(rows.len(), 2);

    let team_a = rows[0].as_tuple().unwrap();
    assert_eq!(team_a.at(0).unwrap().as_scalar(), Some(&Value::from("teamA")));
    assert_eq!(
        team_a.get("avg_age").unwrap().as_scalar(),
        Some(&Value::Float(15.0))
    );
    // Slots are also addressable by the expression that produced them.
    assert_eq!(
        team_a.get_expr(&avg(m.field("age")?)?).unwrap().as_scalar(),
        Some(&Value::Float(15.0))
    );
    let team_b = rows[1].as_tuple().unwrap();
    assert_eq!(
        team_b.get("avg_age").unwrap().as_scalar(),
        Some(&Value::Float(35.0))
    );
    Ok(())
}

#[test]
fn join_filtered_by_related_entity() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;
    let team = m.relate("team")?;

    let rows = Query::select_from(&m)
        .join(&team, "t")
        .r#where(eq(team.field("name")?, "teamA")?)?
        .order_by([asc(m.field("username")?)])
        .fetch_all(&executor)?;
    let names: Vec<String> = rows.iter().map(username).collect();
    assert_eq!(names, ["member1", "member2"]);
    Ok(())
}

#[test]
fn left_join_on_gates_the_joined_side_only() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;
    let team = m.relate("team")?;

    let rows = Query::new()
        .select([&m, &team])
        .from([m.clone()])
        .left_join_on(&team, "t", eq(team.field("name")?, "teamA")?)
        .order_by([asc(m.field("id")?)])
        .fetch_all(&executor)?;
    assert_eq!(rows.len(), 4);

    let first = rows[0].as_tuple().unwrap();
    let first_team = first.at(1).unwrap().as_entity().unwrap();
    assert_eq!(first_team.get("name"), Some(&Value::from("teamA")));

    // teamB members keep their row; the joined side comes back NULL.
    let last = rows[3].as_tuple().unwrap();
    let last_team = last.at(1).unwrap().as_entity().unwrap();
    assert_eq!(last_team.get("name"), Some(&Value::Null));
    Ok(())
}

#[test]
fn theta_join_matches_usernames_to_team_names() -> Result<()> {
    let conn = connection();
    conn.execute_batch(
        "INSERT INTO member (id, username, age, team_id) VALUES
             (5, 'teamA', 100, NULL),
             (6, 'teamB', 100, NULL);",
    )
    .unwrap();
    let executor = Executor::new(&conn);
    let meta = common::metamodel();
    let m = Path::root(meta.clone(), "Member", "m")?;
    let t = Path::root(meta, "Team", "t")?;

    let rows = Query::new()
        .select([&m])
        .from([m.clone(), t.clone()])
        .r#where(eq(m.field("username")?, t.field("name")?)?)?
        .order_by([asc(m.field("username")?)])
        .fetch_all(&executor)?;
    let names: Vec<String> = rows.iter().map(username).collect();
    assert_eq!(names, ["teamA", "teamB"]);
    Ok(())
}

#[test]
fn fetch_count_ignores_pagination() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;

    let query = Query::select_from(&m)
        .r#where(gt(m.field("age")?, 15)?)?
        .order_by([asc(m.field("username")?)])
        .limit(1)?;
    assert_eq!(query.fetch_count(&executor)?, 3);
    assert_eq!(query.fetch_all(&executor)?.len(), 1);
    Ok(())
}

#[test]
fn scalar_projection_yields_values() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;

    let rows = Query::new()
        .select([m.field("username")?])
        .from([m.clone()])
        .order_by([asc(m.field("age")?)])
        .fetch_all(&executor)?;
    let first = rows[0].as_scalar().unwrap();
    assert_eq!(first, &Value::from("member1"));
    Ok(())
}

#[test]
fn rows_stream_lazily_and_release_on_drop() -> Result<()> {
    let conn = connection();
    let executor = Executor::new(&conn);
    let m = member()?;
    let query = Query::select_from(&m).order_by([asc(m.field("id")?)]);

    {
        let mut rows = query.fetch(&executor)?;
        let first = rows.next().unwrap()?;
        assert_eq!(username(&first), "member1");
        // Dropped here with three rows unread.
    }

    // The connection is immediately reusable.
    assert_eq!(query.fetch_count(&executor)?, 4);
    Ok(())
}

#[test]
fn cancellation_stops_before_and_between_rows() -> Result<()> {
    let conn = connection();
    let m = member()?;
    let query = Query::select_from(&m);

    let token = CancelToken::new();
    token.cancel();
    let executor = Executor::with_cancel(&conn, token);
    assert!(matches!(query.fetch_all(&executor), Err(Error::Cancelled)));

    let token = CancelToken::new();
    let executor = Executor::with_cancel(&conn, token.clone());
    let mut rows = query.fetch(&executor)?;
    assert!(rows.next().unwrap().is_ok());
    token.cancel();
    assert!(matches!(rows.next(), Some(Err(Error::Cancelled))));
    assert!(rows.next().is_none());
    Ok(())
}
