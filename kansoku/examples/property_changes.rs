use std::sync::Arc;

use kansoku::*;
use parking_lot::Mutex;

// A subject with observable properties
struct Person {
    events: EventHub,
    name: Mutex<String>,
    age: Mutex<u32>,
}

impl_observable!(Person, events);

impl Person {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            events: EventHub::new(["Changed", PROPERTY_CHANGED]),
            name: Mutex::new(name.to_string()),
            age: Mutex::new(0),
        })
    }

    fn birthday(&self) {
        let age = {
            let mut age = self.age.lock();
            *age += 1;
            *age
        };
        self.events.raise_property_changed("person", "Age");
        self.events.raise("Changed", params!["person", age]);
    }

    fn rename(&self, name: &str) {
        *self.name.lock() = name.to_string();
        self.events.raise_property_changed("person", "Name");
        self.events.raise("Changed", params!["person"]);
    }
}

fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let person = Person::new("Ada");
    let monitor = monitor(&person)?;

    person.birthday();
    person.birthday();
    person.rename("Grace");

    println!("Monitoring: {:?}", monitor.monitored_events());
    monitor.debug_print();

    let changed = monitor.recording_for("Changed")?;
    println!("Changed raised {} times", changed.count());

    // Only the raises that carried the new age
    let with_age = changed.clone().matching(|e| e.arg::<u32>().is_some());
    for e in with_age.iter() {
        println!("  {} -> age {:?}", e, e.arg::<u32>());
    }

    println!("Age changes:  {}", monitor.property_changes(Some("Age"))?.count());
    println!("Name changes: {}", monitor.property_changes(Some("Name"))?.count());
    println!("Any property: {}", monitor.property_changes(None)?.count());

    // The rename happened after the last age change
    if let Some(last_age) = monitor.property_changes(Some("Age"))?.last() {
        let later = monitor.property_changes(Some("Name"))?.after(&last_age);
        println!("Name changes after last birthday: {}", later.count());
    }

    monitor.reset();
    println!("After reset: {} occurrences", monitor.occurred_events().len());

    monitor.dispose();
    person.birthday();
    println!("After dispose: {} occurrences", monitor.occurred_events().len());
    Ok(())
}
