pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_localidad.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_localidad.sql")),
				"tables/002_tipo_de_propiedad.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_tipo_de_propiedad.sql")),
				"tables/003_estilo_arquitectonico.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_estilo_arquitectonico.sql")),
				"tables/004_tipo_de_visualizacion.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_tipo_de_visualizacion.sql")),
				"tables/005_propiedad.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_propiedad.sql")),
				"tables/006_propiedad_tipo_visualizacion.sql" => out.push_str(include_str!(
					"../../../sql/tables/006_propiedad_tipo_visualizacion.sql"
				)),
				"tables/007_imagen2d.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_imagen2d.sql")),
				_ => {
					out.push_str(line);
					out.push('\n');
				},
			}

			out.push('\n');

			continue;
		}

		out.push_str(line);
		out.push('\n');
	}

	out
}
