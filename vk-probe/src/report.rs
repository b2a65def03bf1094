//! Human-readable output for the probe

use vkbind_rs::{Entry, Result, SymbolTable};

pub fn print_symbols(table: &SymbolTable) {
    println!("\nExports ({})", table.len());
    for (name, address) in table.iter() {
        println!("  {name:<40} {:p}", address.as_ptr());
    }
}

pub fn print_entry(entry: &Entry, layer_extensions: bool) -> Result<()> {
    println!("\nInstance version: {}", entry.instance_version()?);

    let layers = entry.enumerate_instance_layer_properties()?;
    println!("\nLayers ({})", layers.len());
    for layer in &layers {
        println!(
            "  {} (spec {}, impl {}): {}",
            layer.name, layer.spec_version, layer.implementation_version, layer.description
        );
        if layer_extensions {
            for extension in entry.enumerate_instance_extension_properties(Some(&layer.name))? {
                println!("      {} v{}", extension.name, extension.spec_version);
            }
        }
    }

    let extensions = entry.enumerate_instance_extension_properties(None)?;
    println!("\nInstance extensions ({})", extensions.len());
    for extension in &extensions {
        println!("  {} v{}", extension.name, extension.spec_version);
    }

    Ok(())
}
