// Example: building a genotype table in code and computing centered-IBS kinship

use kinmat::data::{Chromosome, FeatureTableBuilder, GenomicFeature, HaplotypeSiteBuilder};
use kinmat::data::{SnpSiteBuilder, TaxaListBuilder};
use kinmat::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("🧬 kinmat Kinship Example");
    println!("=========================\n");

    let taxa = ["B73", "Mo17", "W22", "Oh43"]
        .iter()
        .collect::<TaxaListBuilder>()
        .build();
    let mut table = FeatureTableBuilder::new(Arc::clone(&taxa));

    // Biallelic SNPs with IUPAC calls
    let snps: [(i32, [&str; 4]); 3] = [
        (100, ["A", "M", "C", "A"]),
        (200, ["G", "T", "K", "N"]),
        (300, ["C", "C", "T", "Y"]),
    ];
    for (pos, calls) in snps {
        let feature = GenomicFeature::at(Chromosome::new("1"), pos);
        let mut site = SnpSiteBuilder::new(feature, Arc::clone(&taxa));
        for (taxon, call) in calls.iter().enumerate() {
            site.set_call(taxon, call)?;
        }
        table.add(site.build()?)?;
    }

    // A multiallelic haplotype block
    let feature = GenomicFeature::range(Chromosome::new("2"), 5_000, 5_800).with_name("block1");
    let mut block = HaplotypeSiteBuilder::new(feature, Arc::clone(&taxa), 2)?;
    block.set_call(0, "hapA/hapA")?;
    block.set_call(1, "hapB/hapC")?;
    block.set_call(2, "hapC/hapC")?;
    block.set_call(3, "hapA/hapB")?;
    table.add(block.build()?)?;

    let table = table.build();
    println!("{}\n", TableSummary::from_table(&table));

    let progress = |percent: u8, message: Option<&str>| {
        println!("  {:>3}% {}", percent, message.unwrap_or(""));
    };
    let kinship = EndelmanKinship::new(&table)
        .num_workers(2)
        .with_listener(&progress)
        .build()?;

    println!("\n📊 Centered-IBS kinship:");
    print!("{:<6}", "");
    for taxon in taxa.iter() {
        print!("{:>9}", taxon.name());
    }
    println!();
    for (i, taxon) in taxa.iter().enumerate() {
        print!("{:<6}", taxon.name());
        for value in kinship.row(i) {
            print!("{:>9.4}", value);
        }
        println!();
    }

    let direct = centered_ibs_reference(&table, 255)?;
    let max_diff = kinship
        .upper_triangle()
        .iter()
        .zip(direct.upper_triangle())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    println!("\n✅ Max difference from direct formula: {:.2e}", max_diff);
    Ok(())
}
