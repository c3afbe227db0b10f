//! `socgen cpus`.

use socgen_cpu::{CpuDescriptor, CpuRegistry};

/// Lists every CPU with its variants; the default variant is starred.
pub fn run() -> Result<i32, Box<dyn std::error::Error>> {
    for descriptor in CpuRegistry::builtin().descriptors() {
        println!("{}", cpu_line(descriptor));
    }
    Ok(0)
}

fn cpu_line(d: &CpuDescriptor) -> String {
    let variants: Vec<String> = d
        .variants
        .iter()
        .map(|v| {
            if Some(*v) == d.default_variant {
                format!("{v}*")
            } else {
                v.to_string()
            }
        })
        .collect();
    format!("{:<14} {:<14} {}", d.name, d.human_name, variants.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_variant_is_marked() {
        let registry = CpuRegistry::builtin();
        let vexii = registry.lookup("vexiiriscv").unwrap();
        assert!(cpu_line(vexii).ends_with("standard linux* debian"));
        let none = registry.lookup("none").unwrap();
        let line = cpu_line(none);
        assert!(line.starts_with("none "));
        assert!(line.trim_end().ends_with("No CPU"));
    }
}
