// Example walking a document lazily and deserializing part of it

use lazyjson::{Error, Parser, Schema, Value};

#[derive(Debug, Default)]
struct Server {
    host: String,
    port: i64,
    tls: bool,
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let json = r#"{
        "host": "example.org",
        "port": 8443,
        "tls": true,
        "routes": [
            {"path": "/", "backend": "web"},
            {"path": "/api", "backend": "api"},
            {"path": "/health"}
        ]
    }"#;

    let parser = Parser::new();
    let mut doc = parser.iterate_input(json)?;
    println!("Input: {} bytes, root is {}", doc.view().len(), doc.json_type()?);

    // Only the fields touched here are decoded.
    if let Some(host) = doc.find_field("host")? {
        println!("host = {}", host.as_str().unwrap_or_default());
    }

    println!("Backends:");
    doc.at_path_each("$.routes[*].backend", |backend| {
        println!("  {}", backend.as_str().unwrap_or("?"));
    })?;

    if let Some(Value::Array(mut routes)) = doc.at_pointer("/routes")? {
        let first = routes.at(0)?.map(|v| v.to_owned_value()).transpose()?;
        println!("{} routes, first {:?}", routes.count_elements(), first);
    }

    let schema = Schema::new()
        .string("host", |s: &mut Server, host| s.host = host)
        .number("port", |s: &mut Server, port| s.port = port.as_i64().unwrap_or_default())
        .boolean("tls", |s: &mut Server, tls| s.tls = tls);
    doc.rewind();
    let server = schema.deserialize(&mut doc)?;
    println!("Deserialized: {:?}", server);

    // Handing the scratch back lets the parser serve another document;
    // this one revives on its next access.
    doc.release();
    let mut other = parser.iterate_input("[1, 2, 3]")?;
    let total: i64 = other.array_values()?.iter().filter_map(Value::as_i64).sum();
    println!("Sum of second document: {}", total);
    drop(other);
    println!("First document again: port {:?}", doc.fetch("port")?.as_i64());

    Ok(())
}
