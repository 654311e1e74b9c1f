mod codec_flows;
mod matrix_flows;
