//! Tables command CLI handler.

use super::export::print_plan;
use super::SourceArgs;
use crate::export::Exporter;
use crate::progress::StderrProgress;
use crate::source::MySqlSource;

pub fn run(args: SourceArgs) -> anyhow::Result<()> {
    let settings = args.resolve(None, false)?;
    let exporter = Exporter::new(settings.export)?;

    let mut source = MySqlSource::connect(&settings.source)?;
    let plans = exporter.plan(&mut source, &mut StderrProgress)?;
    print_plan(&plans);

    source.close()
}
