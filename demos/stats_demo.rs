use clap::Parser;
use linprobe::HashSet;
use linprobe::identity::hash_one;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "items", default_value_t = 1000)]
    items: u64,

    /// Remove every n-th item after filling the set.
    #[arg(short = 'r', long = "remove_every", default_value_t = 0)]
    remove_every: u64,
}

fn main() -> Result<(), linprobe::Error> {
    let args = Args::parse();

    let items: Vec<u64> = (0..args.items).collect();
    let mut set = HashSet::new(|n: &u64| hash_one(n), |a: &u64, b: &u64| a == b)?;

    println!("Initial capacity: {}", set.capacity());
    println!("Filling set with {} u64 values...", items.len());

    let mut capacity = set.capacity();
    for item in &items {
        if set.add(item)?.is_some() {
            panic!("Value already exists in set: {}", item);
        }
        if set.capacity() != capacity {
            println!(
                "  grew {} -> {} slots at {} items",
                capacity,
                set.capacity(),
                set.count()
            );
            capacity = set.capacity();
        }
    }

    if args.remove_every > 0 {
        let removed = items
            .iter()
            .step_by(args.remove_every as usize)
            .filter(|item| set.remove(item).is_some())
            .count();
        println!("Removed {} values", removed);
    }

    println!("Set holds {} values", set.count());
    println!(
        "Final load factor: {:.2}%",
        (set.count() as f64 / set.capacity() as f64) * 100.0
    );

    set.probe_histogram().print();
    set.debug_stats().print();

    Ok(())
}
