//! Thin smoke driver: builds a [`Database`], runs a handful of canned
//! queries through [`Database::execute`], and prints whatever each one
//! returns. No argument parsing, no REPL — just enough to exercise the
//! library end to end from the command line.

use memdb::{Database, ResultSet};

fn run(db: &mut Database, query: &str) {
    println!("> {}", query);
    match db.execute(query) {
        Ok(rs) => print_resultset(&rs),
        Err(e) => println!("  error: {}", e),
    }
}

fn print_resultset(rs: &ResultSet) {
    if rs.column_count() == 0 {
        println!("  ok ({:?})", rs.elapsed());
        return;
    }
    let names: Vec<&str> = rs.columns().iter().map(|c| c.name.as_str()).collect();
    println!("  {}", names.join(" | "));
    for row in rs {
        let cells: Vec<String> =
            names.iter().map(|name| format!("{:?}", row.get(name).unwrap())).collect();
        println!("  {}", cells.join(" | "));
    }
    println!("  ({} rows in {:?})", rs.row_count(), rs.elapsed());
}

fn main() {
    let mut db = Database::new();

    run(&mut db, r#"create table users ({key, autoincrement} id: int32, login: string[16])"#);
    run(&mut db, r#"insert (, "alice") to users"#);
    run(&mut db, r#"insert (, "bob") to users"#);
    run(&mut db, r#"insert (, "carol") to users"#);
    run(&mut db, "create ordered index on users by login");
    run(&mut db, r#"select id, login from users where login = "bob""#);
    run(&mut db, "select id, login from users where id >= 2 && id <= 3");
    run(&mut db, r#"insert (login = "dave") to users"#);
    run(&mut db, r#"insert (, "alice") to users"#); // uniqueness not declared on login, should succeed

    print!("\n--- database summary ---\n");
    let mut summary = Vec::new();
    db.info(&mut summary).expect("info never fails writing to a Vec");
    print!("{}", String::from_utf8_lossy(&summary));

    let mut buf = Vec::new();
    db.save_to_file(&mut buf).expect("save never fails writing to a Vec");
    let mut cursor = &buf[..];
    let reloaded = Database::load_from_file(&mut cursor).expect("round-trip of what we just wrote");
    println!("\nreloaded {} bytes, users table has {} rows", buf.len(), reloaded.table("users").unwrap().row_count());
}
